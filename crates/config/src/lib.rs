//! Memload Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! A minimal config just works - only specify what you need to change.
//! CLI flags override whatever the file says.
//!
//! # Example Minimal Config
//!
//! ```toml
//! [global]
//! pattern = "/data/appsinstalled/*.tsv.gz"
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [global]
//! pattern = "/data/appsinstalled/*.tsv.gz"
//! workers_per_file = 5
//! file_parallelism = 8
//! task_queue_size = 1024
//! poll_timeout_secs = 1.0
//! error_rate_threshold = 0.01
//!
//! [log]
//! level = "info"
//! output = "stdout"
//!
//! [memc]
//! timeout_secs = 15
//! retries = 1
//! backoff_factor = 1.0
//!
//! [shards]
//! idfa = "127.0.0.1:33013"
//! gaid = "127.0.0.1:33014"
//! adid = "127.0.0.1:33015"
//! dvid = "127.0.0.1:33016"
//! ```

mod error;
mod global;
mod logging;
mod memc;
mod shards;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogLevel, LogOutput};
pub use memc::MemcConfig;
pub use shards::ShardsConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline-wide settings (pattern, worker counts, queue size)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Memcached client settings (timeout, retry budget, backoff)
    pub memc: MemcConfig,

    /// Device-type → shard-address assignments
    pub shards: ShardsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Validate the configuration
    ///
    /// Checks that the error-rate threshold is in (0, 1], worker counts
    /// and queue sizes are positive, and every shard address looks like
    /// `host:port`.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }
}
