//! Logging configuration
//!
//! Stdout carries protocol traffic, so console output goes to stderr. An
//! optional JSON log file is written through a non-blocking appender.

use anyhow::Context;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
        }
    }
}

impl LoggingConfig {
    pub fn new(debug: bool, file_path: Option<PathBuf>) -> Self {
        Self {
            level: if debug { "debug" } else { "info" }.to_string(),
            file_path,
        }
    }

    /// Install the global subscriber. The returned guard flushes the log file
    /// on drop and must be held for the life of the process.
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let console_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(io::stderr);

        let (file_layer, guard) = match &self.file_path {
            Some(path) => {
                let (directory, file_name) = split_log_path(path)?;
                let appender = tracing_appender::rolling::never(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install log subscriber")?;

        tracing::debug!(level = %self.level, file = ?self.file_path, "Logging initialized");
        Ok(guard)
    }
}

/// Directory and file name of a log path; a bare file name logs to the
/// working directory
fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path {} has no file name", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, PathBuf::from(file_name)))
}
