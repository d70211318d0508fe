// src/main.rs
use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod app;
mod cli;
mod config;
mod diagnostics;
mod interfaces;
mod providers;
mod services;
mod types;
mod ui;
mod utils;

#[cfg(test)]
mod tests;

use app::App;
use config::Config;
use diagnostics::TracingDiagnostics;
use providers::HttpFetcher;
use services::ChannelSink;
use types::OutboundMessage;

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let args = cli::CliArgs::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;

    if let Err(e) = utils::init_logging(&config) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    if cli::handle_cli_args(&args, &config).await? {
        return Ok(());
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(config.search.request_timeout_secs))
        .context("Failed to build HTTP client")?;
    let (sticker_tx, mut sticker_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let mut app = App::new(
        &config,
        Arc::new(fetcher),
        Arc::new(ChannelSink::new(sticker_tx)),
        Arc::new(TracingDiagnostics),
    );
    if let Some(key) = args.giphy_key.clone() {
        app.set_giphy_credential(key, None);
    }
    if let Some(key) = args.tenor_key.clone() {
        app.set_tenor_credential(key, None);
    }
    if !app.giphy_enabled() && !app.tenor_enabled() {
        tracing::warn!("no provider API keys configured, searches will find nothing");
    }

    let app_result = interfaces::run_tui(&mut app).await;
    drop(app);

    // Stickers go to stdout once the terminal is back to normal.
    while let Ok(message) = sticker_rx.try_recv() {
        println!("{}", serde_json::to_string(&message)?);
    }

    app_result.map_err(|app_err| anyhow::anyhow!("Error in main loop: {}", app_err))?;

    Ok(())
}
