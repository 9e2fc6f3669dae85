//! Memcached client configuration

use std::time::Duration;

use serde::Deserialize;

/// Memcached connection and retry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemcConfig {
    /// Socket timeout in seconds (connect, write and read individually)
    /// Default: 15
    pub timeout_secs: u64,

    /// Additional attempts after a failed write
    /// Default: 1
    pub retries: u32,

    /// Base backoff in seconds; attempt N sleeps `backoff_factor * 2^N`
    /// Default: 1.0
    pub backoff_factor: f64,
}

impl Default for MemcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retries: 1,
            backoff_factor: 1.0,
        }
    }
}

impl MemcConfig {
    /// Socket timeout as a `Duration`
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
