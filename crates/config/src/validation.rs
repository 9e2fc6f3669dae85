//! Configuration validation
//!
//! Catches misconfiguration at startup rather than mid-batch.

use crate::error::{ConfigError, Result};
use crate::Config;

/// Validate a fully-parsed configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_global(config)?;
    validate_memc(config)?;
    validate_shards(config)?;
    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    let global = &config.global;

    if global.pattern.is_empty() {
        return Err(ConfigError::invalid_value(
            "global",
            "pattern",
            "must not be empty",
        ));
    }

    if global.workers_per_file == 0 {
        return Err(ConfigError::invalid_value(
            "global",
            "workers_per_file",
            "must be at least 1",
        ));
    }

    if global.task_queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "global",
            "task_queue_size",
            "must be at least 1",
        ));
    }

    if !(global.poll_timeout_secs > 0.0) {
        return Err(ConfigError::invalid_value(
            "global",
            "poll_timeout_secs",
            "must be positive",
        ));
    }

    if !(global.error_rate_threshold > 0.0 && global.error_rate_threshold <= 1.0) {
        return Err(ConfigError::invalid_value(
            "global",
            "error_rate_threshold",
            "must be in (0, 1]",
        ));
    }

    Ok(())
}

fn validate_memc(config: &Config) -> Result<()> {
    let memc = &config.memc;

    if memc.timeout_secs == 0 {
        return Err(ConfigError::invalid_value(
            "memc",
            "timeout_secs",
            "must be at least 1",
        ));
    }

    if !(memc.backoff_factor >= 0.0) {
        return Err(ConfigError::invalid_value(
            "memc",
            "backoff_factor",
            "must be non-negative",
        ));
    }

    Ok(())
}

fn validate_shards(config: &Config) -> Result<()> {
    if config.shards.map.is_empty() {
        return Err(ConfigError::NoShards);
    }

    for (device_type, addr) in &config.shards.map {
        if device_type.is_empty() {
            return Err(ConfigError::invalid_value(
                "shards",
                "device_type",
                "must not be empty",
            ));
        }

        // host:port, both halves non-empty
        let valid = addr
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(ConfigError::invalid_value(
                "shards",
                "address",
                format!("'{addr}' for '{device_type}' is not host:port"),
            ));
        }
    }

    Ok(())
}
