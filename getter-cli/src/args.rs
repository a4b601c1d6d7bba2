//! Command-line arguments and their merge with the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use getter::config::{ConfigFile, DownloaderConfig};
use getter::logging::LogConfig;

use crate::error::CliError;

/// Download every URL in a list using parallel ranged requests.
#[derive(Debug, Parser)]
#[command(name = "getter", version, about)]
pub struct Args {
    /// File with one URL per line (`host[:port]/path`)
    pub url_file: PathBuf,

    /// Number of worker threads
    pub workers: usize,

    /// Directory to store downloaded files in
    pub download_dir: PathBuf,

    /// Largest byte range requested at once
    #[arg(long, value_name = "BYTES")]
    pub max_chunk_size: Option<u64>,

    /// Socket timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file [default: <config dir>/getter/config.ini]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Settings for one run after merging all sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub downloader: DownloaderConfig,
    pub logging: LogConfig,
}

impl Args {
    /// Load the configuration file named by `--config`, or the default one.
    pub fn load_config_file(&self) -> Result<ConfigFile, CliError> {
        let loaded = match &self.config {
            Some(path) => ConfigFile::load(path),
            None => ConfigFile::load_default(),
        };
        loaded.map_err(|e| CliError::Config(e.to_string()))
    }

    /// Apply command-line values on top of `file`.
    pub fn resolve(&self, file: ConfigFile) -> Result<Resolved, CliError> {
        if self.workers == 0 {
            return Err(CliError::Config(
                "WORKERS must be at least 1".to_string(),
            ));
        }
        if self.max_chunk_size == Some(0) {
            return Err(CliError::Config(
                "--max-chunk-size must be at least 1".to_string(),
            ));
        }

        let mut downloader = file
            .downloader
            .with_workers(self.workers)
            .with_output_dir(&self.download_dir);
        if let Some(max) = self.max_chunk_size {
            downloader = downloader.with_max_chunk_bytes(max);
        }
        if let Some(secs) = self.timeout {
            downloader = downloader.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }

        let mut logging = file.logging;
        match self.verbose {
            0 => {}
            1 => logging.level = "debug".to_string(),
            _ => logging.level = "trace".to_string(),
        }
        if self.log_file.is_some() {
            logging.file = self.log_file.clone();
        }

        Ok(Resolved {
            downloader,
            logging,
        })
    }
}
