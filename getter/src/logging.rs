//! Logging setup.
//!
//! Installs a `tracing` subscriber writing human-readable lines to stderr,
//! plus an optional plain-text log file fed through a non-blocking writer.
//! `RUST_LOG`, when set, takes precedence over the configured level.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::LocalTime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default log level directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level directive could not be parsed.
    #[error("invalid log level {level:?}: {reason}")]
    InvalidLevel { level: String, reason: String },

    /// The log file location is unusable.
    #[error("cannot log to {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive such as `info` or `getter=debug`.
    pub level: String,
    /// Optional file receiving a copy of every log line.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// Parse a filter directive.
pub fn parse_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the life of the program.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.level)?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .with_timer(LocalTime::new(Rfc3339));

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_timer(LocalTime::new(Rfc3339));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let file_error = |source| LoggingError::File {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path.file_name().ok_or_else(|| {
        file_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "log path has no file name",
        ))
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).map_err(file_error)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)
        .map_err(|e| file_error(io::Error::new(io::ErrorKind::Other, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.file.is_none());
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::default()
            .with_level("getter=debug")
            .with_file(Some(PathBuf::from("/tmp/getter.log")));
        assert_eq!(config.level, "getter=debug");
        assert_eq!(config.file, Some(PathBuf::from("/tmp/getter.log")));
    }

    #[test]
    fn test_parse_filter() {
        assert!(parse_filter("debug").is_ok());
        assert!(parse_filter("getter=trace,warn").is_ok());

        let err = parse_filter("getter=[").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidLevel { .. }));
    }

    #[test]
    fn test_log_file_created_at_exact_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("getter.log");

        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_log_path_naming_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let taken = dir.path().join("taken");
        std::fs::create_dir(&taken).unwrap();

        let err = open_log_file(&taken).unwrap_err();
        match err {
            LoggingError::File { path, .. } => assert_eq!(path, taken),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_log_file_without_name_rejected() {
        assert!(matches!(
            open_log_file(Path::new("/")),
            Err(LoggingError::File { .. })
        ));
    }
}
