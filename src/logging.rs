//! Structured logging set-up.
//!
//! The destination is chosen once at start-up and installed as the
//! subscriber's writer; nothing else holds logging state.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "fantasy_recap=info,tower_http=info";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Console,
    /// Appends to the file, creating it if needed.
    File(PathBuf),
}

impl LogSink {
    fn writer(&self) -> Result<BoxMakeWriter> {
        match self {
            LogSink::Console => Ok(BoxMakeWriter::new(std::io::stdout)),
            LogSink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
        }
    }

    fn is_console(&self) -> bool {
        matches!(self, LogSink::Console)
    }
}

/// Initialise the global `tracing` subscriber.
///
/// JSON output is enabled by `json` or by setting `FANTASY_RECAP_LOG_JSON`.
pub fn init(sink: &LogSink, json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = json || std::env::var("FANTASY_RECAP_LOG_JSON").is_ok();
    let writer = sink.writer()?;

    let result = if json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .try_init()
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_ansi(sink.is_console())
            .with_writer(writer)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_file() {
        let path = std::env::temp_dir().join(format!("fantasy-recap-{}.log", uuid::Uuid::new_v4()));
        let sink = LogSink::File(path.clone());
        assert!(sink.writer().is_ok());
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unwritable_file_sink_is_error() {
        let sink = LogSink::File(PathBuf::from("/nonexistent-dir/for/sure/recap.log"));
        assert!(sink.writer().is_err());
    }

    #[test]
    fn test_console_sink() {
        assert!(LogSink::Console.is_console());
        assert!(LogSink::Console.writer().is_ok());
    }
}
