// src/cli.rs
use crate::{
    config::Config,
    diagnostics::TracingDiagnostics,
    providers::{GifProvider, HttpFetcher},
    services::{Aggregator, MessageBuilder, Searcher},
    types::{GifResult, Provenance},
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Print the log file and exit
    #[arg(long, value_name = "FILE_PATH", num_args = 0..=1, value_hint = clap::ValueHint::FilePath)]
    pub logs: Option<Option<PathBuf>>,

    /// Use this config file instead of ~/.gifpanel/config.toml
    #[arg(long, value_name = "FILE_PATH", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Giphy API key, replacing the configured one
    #[arg(long, value_name = "KEY", env = "GIFPANEL_GIPHY_KEY", hide_env_values = true)]
    pub giphy_key: Option<String>,

    /// Tenor API key, replacing the configured one
    #[arg(long, value_name = "KEY", env = "GIFPANEL_TENOR_KEY", hide_env_values = true)]
    pub tenor_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search both providers once and print the merged results
    Search {
        query: String,
        /// Print the sticker message of every result as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show which providers are enabled
    Providers,
}

/// Handles CLI arguments.
/// Returns `Ok(true)` if the program should exit early, `Ok(false)` to continue.
pub async fn handle_cli_args(args: &CliArgs, config: &Config) -> anyhow::Result<bool> {
    if let Some(ref option_for_path_or_default) = args.logs {
        let log_file_to_view = option_for_path_or_default
            .clone()
            .unwrap_or_else(|| config.paths.log_file.clone());

        if !log_file_to_view.exists() {
            eprintln!(
                "Error: Log file not found at '{}'",
                log_file_to_view.display()
            );
            return Ok(true);
        }

        let content = std::fs::read_to_string(&log_file_to_view)?;
        content.lines().for_each(|line| eprintln!("{}", line));
        return Ok(true);
    }

    match args.command {
        Some(Commands::Search { ref query, json }) => {
            let aggregator = build_aggregator(args, config)?;
            run_search(&aggregator, config, query, json).await?;
            Ok(true)
        }
        Some(Commands::Providers) => {
            let aggregator = build_aggregator(args, config)?;
            for provider in aggregator.providers() {
                print_provider(provider);
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

fn build_aggregator(args: &CliArgs, config: &Config) -> anyhow::Result<Aggregator> {
    let fetcher = HttpFetcher::new(Duration::from_secs(config.search.request_timeout_secs))?;
    let aggregator = Aggregator::from_config(config, Arc::new(fetcher), Arc::new(TracingDiagnostics));

    if let Some(ref key) = args.giphy_key {
        aggregator.provider(Provenance::Giphy).set_credential(key.clone(), None);
    }
    if let Some(ref key) = args.tenor_key {
        aggregator.provider(Provenance::Tenor).set_credential(key.clone(), None);
    }

    Ok(aggregator)
}

async fn run_search(
    aggregator: &Aggregator,
    config: &Config,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let state = aggregator.run_search(query).await;

    if let Some(error) = state.error {
        eprintln!("{}", error.red());
        return Ok(());
    }

    if json {
        let builder = MessageBuilder::new(config.message.clone());
        for result in &state.results {
            let prefix = aggregator.provider(result.provenance).credential().media_prefix;
            match builder.build(result, &prefix) {
                Ok(message) => println!("{}", serde_json::to_string(&message)?),
                Err(e) => eprintln!("{}", e.to_string().yellow()),
            }
        }
    } else {
        for result in &state.results {
            println!("{}", format_result(result));
        }
    }

    Ok(())
}

fn format_result(result: &GifResult) -> String {
    let mimetype = result
        .variants
        .first()
        .and_then(|v| v.mimetype.as_deref())
        .unwrap_or("unknown");
    format!(
        "{} {} ({}) {}",
        format!("[{}]", result.provenance).cyan(),
        result.label().bold(),
        mimetype,
        result.display_url.dimmed()
    )
}

fn print_provider(provider: &dyn GifProvider) {
    let credential = provider.credential();
    let status = if credential.is_enabled() {
        "enabled".green()
    } else {
        "disabled (no API key)".red()
    };
    println!("{:<8} {}", provider.name().bold(), status);
    println!("         media prefix: {}", credential.media_prefix);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_command() {
        let args = CliArgs::parse_from(["gifpanel", "search", "happy cat", "--json"]);
        match args.command {
            Some(Commands::Search { query, json }) => {
                assert_eq!(query, "happy cat");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_logs_without_path() {
        let args = CliArgs::parse_from(["gifpanel", "--logs"]);
        assert!(matches!(args.logs, Some(None)));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_parse_config_path() {
        let args = CliArgs::parse_from(["gifpanel", "--config", "/tmp/gp.toml", "providers"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/gp.toml")));
        assert!(matches!(args.command, Some(Commands::Providers)));
    }
}
