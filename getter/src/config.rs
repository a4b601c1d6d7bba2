//! Downloader configuration.
//!
//! Values come from three places, in increasing precedence: built-in
//! defaults, an INI configuration file, and command-line flags. This module
//! covers the first two; the CLI applies its flags through the `with_*`
//! builders.
//!
//! ```ini
//! [download]
//! workers = 8
//! max_chunk_size = 41943040
//! queue_capacity = 16
//! timeout = 30
//! user_agent = getter
//!
//! [output]
//! directory = ~/Downloads/getter
//!
//! [logging]
//! level = info
//! file = ~/.cache/getter/getter.log
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::http::DEFAULT_USER_AGENT;
use crate::logging::LogConfig;
use crate::planner::MAX_CHUNK_BYTES;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or is not valid INI.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// A key holds a value of the wrong shape.
    #[error("invalid value {value:?} for [{section}] {key}: {reason}")]
    Invalid {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Worker thread count, also the planner's minimum split.
    pub workers: usize,
    /// Largest chunk the planner will produce.
    pub max_chunk_bytes: u64,
    /// Task queue slots; `0` means twice the worker count.
    pub queue_capacity: usize,
    /// Directory receiving the downloaded files.
    pub output_dir: PathBuf,
    /// Socket read/write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_chunk_bytes: MAX_CHUNK_BYTES,
            queue_capacity: 0,
            output_dir: PathBuf::from("."),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_chunk_bytes(mut self, max_chunk_bytes: u64) -> Self {
        self.max_chunk_bytes = max_chunk_bytes;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Queue capacity with the `0` default resolved.
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            self.workers.saturating_mul(2).max(1)
        } else {
            self.queue_capacity
        }
    }

    /// Load a configuration file on top of the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Ok(ConfigFile::load(path)?.downloader)
    }
}

/// Everything a configuration file can set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub downloader: DownloaderConfig,
    pub logging: LogConfig,
}

impl ConfigFile {
    /// Default location, `<config dir>/getter/config.ini`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("getter").join(CONFIG_FILE_NAME))
    }

    /// Load `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Load the file at the default location, or the defaults when it does
    /// not exist.
    pub fn load_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("download")) {
            let download = &mut config.downloader;
            if let Some(workers) = parse_key::<usize>(section, "download", "workers")? {
                if workers == 0 {
                    return Err(invalid("download", "workers", "0", "must be at least 1"));
                }
                download.workers = workers;
            }
            if let Some(max) = parse_key::<u64>(section, "download", "max_chunk_size")? {
                if max == 0 {
                    return Err(invalid(
                        "download",
                        "max_chunk_size",
                        "0",
                        "must be at least 1",
                    ));
                }
                download.max_chunk_bytes = max;
            }
            if let Some(capacity) = parse_key::<usize>(section, "download", "queue_capacity")? {
                download.queue_capacity = capacity;
            }
            if let Some(secs) = parse_key::<u64>(section, "download", "timeout")? {
                download.timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(agent) = non_empty(section, "user_agent") {
                download.user_agent = agent.to_string();
            }
        }

        if let Some(section) = ini.section(Some("output")) {
            if let Some(directory) = non_empty(section, "directory") {
                config.downloader.output_dir = expand_tilde(directory);
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = non_empty(section, "level") {
                config.logging.level = level.to_string();
            }
            if let Some(file) = non_empty(section, "file") {
                config.logging.file = Some(expand_tilde(file));
            }
        }

        Ok(config)
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_key<T>(section: &Properties, name: &str, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(section, key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(name, key, value, &e.to_string())),
        None => Ok(None),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
