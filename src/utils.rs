// src/utils.rs
use crate::config::Config;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Output goes to the configured log
/// file so it never draws over the terminal UI.
pub fn init_logging(config: &Config) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!(
            "warn,gifpanel={}",
            config.general.log_level.as_filter()
        )),
    };

    if let Some(parent) = config.paths.log_file.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.log_file)
        .with_context(|| format!("Failed to open log file {}", config.paths.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}

pub fn truncate_text(text: &str, max_length: usize) -> String {
    let text: &str = text.trim();
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
