//! CLI error type.

use thiserror::Error;

/// Errors that abort the command before or during setup.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read URL list: {0}")]
    UrlList(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Downloader setup failed: {0}")]
    Setup(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Setup(_) => 1,
            CliError::Config(_) | CliError::UrlList(_) | CliError::Logging(_) => 2,
        }
    }
}
