//! Memload - Sharded device-apps bulk loader
//!
//! # Usage
//!
//! ```bash
//! # Load everything matching the default pattern
//! memload --pattern '/data/appsinstalled/*.tsv.gz'
//!
//! # Dry run with per-write debug logging
//! memload --pattern '/data/appsinstalled/*.tsv.gz' --dry
//!
//! # Payload codec self-check
//! memload --test
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use memload_config::{Config, LogConfig, LogLevel, LogOutput};
use memload_loader::{driver, selftest};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Memload - Sharded device-apps bulk loader
#[derive(Parser, Debug)]
#[command(name = "memload")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Glob pattern selecting input files
    #[arg(long)]
    pattern: Option<String>,

    /// Log writes instead of performing them
    #[arg(long)]
    dry: bool,

    /// Run the payload codec self-check and exit
    #[arg(short = 't', long)]
    test: bool,

    /// Append logs to this file instead of stdout
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Shard address for idfa devices
    #[arg(long)]
    idfa: Option<String>,

    /// Shard address for gaid devices
    #[arg(long)]
    gaid: Option<String>,

    /// Shard address for adid devices
    #[arg(long)]
    adid: Option<String>,

    /// Shard address for dvid devices
    #[arg(long)]
    dvid: Option<String>,

    /// Writer workers per file
    #[arg(long)]
    workers_per_file: Option<usize>,

    /// Files processed concurrently (default: CPU count)
    #[arg(long)]
    file_parallelism: Option<usize>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("memload: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.log, &cli) {
        eprintln!("memload: {e:#}");
        process::exit(1);
    }

    if cli.test {
        if let Err(e) = selftest::run() {
            tracing::error!(error = format!("{e:#}"), "self-check failed");
            process::exit(1);
        }
        return;
    }

    tracing::info!(
        pattern = %config.global.pattern,
        dry_run = config.global.dry_run,
        "memload starting"
    );

    if let Err(e) = driver::run(config).await {
        tracing::error!(error = format!("{e:#}"), "unexpected error");
        process::exit(1);
    }
}

/// Load the config file (or defaults) and fold the CLI flags over it
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(pattern) = &cli.pattern {
        config.global.pattern = pattern.clone();
    }
    if cli.dry {
        config.global.dry_run = true;
    }
    if let Some(workers) = cli.workers_per_file {
        config.global.workers_per_file = workers;
    }
    if cli.file_parallelism.is_some() {
        config.global.file_parallelism = cli.file_parallelism;
    }

    for (device_type, addr) in [
        ("idfa", &cli.idfa),
        ("gaid", &cli.gaid),
        ("adid", &cli.adid),
        ("dvid", &cli.dvid),
    ] {
        if let Some(addr) = addr {
            config.shards.set(device_type, addr.clone());
        }
    }

    if let Some(path) = &cli.log {
        config.log.output = LogOutput::File(path.display().to_string());
    }

    config.validate()?;
    Ok(config)
}

/// Initialize the tracing subscriber
///
/// Precedence for the filter: `--log-level`, then the config file, except
/// that a dry run without an explicit level logs at debug so the would-be
/// writes are visible.
fn init_logging(log: &LogConfig, cli: &Cli) -> Result<()> {
    let level = match &cli.log_level {
        Some(level) => level.clone(),
        None if cli.dry && log.level == LogLevel::Info => "debug".to_string(),
        None => log.level.as_str().to_string(),
    };
    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match &log.output {
        LogOutput::Stdout => {
            registry
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogOutput::Stderr => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .init();
        }
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{path}'"))?;
            registry
                .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
                .init();
        }
    }

    Ok(())
}
