//! Logging setup.
//!
//! Everything goes to the terminal; when a log file is configured the same
//! events are appended there without ANSI colours.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the requested verbosity. An explicit level wins over
/// `--verbose`.
pub fn level_directive(verbose: bool, level: Option<Level>) -> String {
    match level {
        Some(level) => level.to_string().to_lowercase(),
        None if verbose => "debug".to_string(),
        None => "info".to_string(),
    }
}

pub fn init_logging(directive: &str, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}
