//! `tracing` subscriber setup.
//!
//! Logs go to stderr by default. Setting `KPI_LOG_FILE` redirects them to a
//! file, which is the only way to see logs while the TUI owns the terminal.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Drop stderr output entirely (used when a full-screen UI is active).
    pub quiet_stderr: bool,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
            log_file: std::env::var_os("KPI_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            quiet_stderr: false,
        }
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| AppError::input(format!("Invalid RUST_LOG filter '{}': {e}", config.log_level)))?;

    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::input(format!("Failed to open log file '{}': {e}", path.display())))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
            .map_err(|e| AppError::runtime(format!("Failed to install logger: {e}")))?;
        return Ok(());
    }

    if config.quiet_stderr {
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AppError::runtime(format!("Failed to install logger: {e}")))?;

    Ok(())
}
