//! Pipeline-wide configuration settings

use serde::Deserialize;

/// Settings that shape the two levels of parallelism and the outcome policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Glob pattern selecting input files
    /// Default: "data/*.tsv.gz"
    pub pattern: String,

    /// Log writes instead of performing them
    /// Default: false
    pub dry_run: bool,

    /// Writer workers per file pipeline
    /// Default: 5
    pub workers_per_file: usize,

    /// Files processed concurrently
    /// Default: None (auto = number of CPU cores)
    pub file_parallelism: Option<usize>,

    /// Capacity of the bounded task queue between parser and writers
    /// Default: 1024
    pub task_queue_size: usize,

    /// Seconds a writer waits on an empty queue before it exits
    /// Default: 1.0
    pub poll_timeout_secs: f64,

    /// Error-rate threshold for the per-file success/failure log
    /// Default: 0.01 (1%)
    pub error_rate_threshold: f64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            pattern: "data/*.tsv.gz".into(),
            dry_run: false,
            workers_per_file: 5,
            file_parallelism: None,
            task_queue_size: 1024,
            poll_timeout_secs: 1.0,
            error_rate_threshold: 0.01,
        }
    }
}

impl GlobalConfig {
    /// Effective number of concurrently processed files
    ///
    /// Returns the configured value, or the CPU count in auto mode.
    pub fn effective_file_parallelism(&self) -> usize {
        self.file_parallelism.unwrap_or_else(num_cpus).max(1)
    }
}

/// Number of available CPUs, defaulting to 4 if detection fails
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
