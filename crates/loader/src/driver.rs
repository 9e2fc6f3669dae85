//! Batch driver
//!
//! Enumerates input files matching the configured glob pattern, sorts
//! them lexically, and processes up to CPU-count files concurrently.
//! Each finished file is atomically renamed in place with a leading dot
//! so a future run never picks it up again.
//!
//! Ctrl-C stops dispatching new files; pipelines already in flight finish
//! best-effort.

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use memload_client::ConnectionPool;
use memload_config::Config;
use memload_pipeline::{
    FilePipeline, FileReport, LoadStats, PipelineConfig, PipelineError, WorkerConfig,
};
use memload_routing::ShardMap;
use tokio::task::JoinSet;

/// Totals across every file in one run
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    /// Files fully processed (and marked)
    pub files: usize,

    /// Summed per-file tallies
    pub stats: LoadStats,
}

/// Run the whole batch described by `config`
///
/// Returns the summary on normal completion, including runs where some
/// files logged a failed load. An empty glob logs a warning and returns
/// an empty summary.
///
/// # Errors
///
/// Only unexpected file-level failures (unreadable input, worker panic)
/// abort the batch; the binary maps them to a non-zero exit.
pub async fn run(config: Config) -> anyhow::Result<BatchSummary> {
    let files = discover_files(&config.global.pattern)?;
    if files.is_empty() {
        tracing::warn!(pattern = %config.global.pattern, "no input files match pattern");
        return Ok(BatchSummary::default());
    }

    let shard_map: Arc<ShardMap> = Arc::new(
        config
            .shards
            .map
            .iter()
            .map(|(device_type, addr)| (device_type.as_str(), addr.as_str()))
            .collect(),
    );

    let pipeline_config = PipelineConfig {
        workers: config.global.workers_per_file,
        task_queue_size: config.global.task_queue_size,
        worker: WorkerConfig {
            retries: config.memc.retries,
            backoff_factor: config.memc.backoff_factor,
            poll_timeout: Duration::from_secs_f64(config.global.poll_timeout_secs),
        },
        error_rate_threshold: config.global.error_rate_threshold,
        dry_run: config.global.dry_run,
    };

    let parallelism = config.global.effective_file_parallelism();
    tracing::info!(
        files = files.len(),
        parallelism,
        dry_run = config.global.dry_run,
        shards = shard_map.shard_count(),
        "batch starting"
    );

    let memc_timeout = config.memc.timeout();
    let mut pending = files.into_iter();
    let mut join_set: JoinSet<Result<FileReport, PipelineError>> = JoinSet::new();

    for _ in 0..parallelism {
        let Some(path) = pending.next() else { break };
        spawn_file(&mut join_set, path, &pipeline_config, &shard_map, memc_timeout);
    }

    let mut summary = BatchSummary::default();
    let mut dispatching = true;
    let mut ctrl_c = pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            joined = join_set.join_next() => {
                let Some(joined) = joined else { break };
                let report = match joined {
                    Ok(Ok(report)) => report,
                    Ok(Err(e)) => return Err(e).context("file pipeline failed"),
                    Err(e) => anyhow::bail!("file task panicked: {e}"),
                };

                mark_processed(&report.path);
                summary.files += 1;
                summary.stats.merge(report.stats);

                if dispatching && let Some(path) = pending.next() {
                    spawn_file(&mut join_set, path, &pipeline_config, &shard_map, memc_timeout);
                }
            }
            _ = &mut ctrl_c, if dispatching => {
                dispatching = false;
                tracing::warn!("interrupt received, finishing in-flight files only");
            }
        }
    }

    tracing::info!(
        files = summary.files,
        processed = summary.stats.processed,
        errors = summary.stats.errors,
        "batch finished"
    );

    Ok(summary)
}

/// Start one file pipeline with its own connection pool
fn spawn_file(
    join_set: &mut JoinSet<Result<FileReport, PipelineError>>,
    path: PathBuf,
    config: &PipelineConfig,
    shard_map: &Arc<ShardMap>,
    memc_timeout: Duration,
) {
    let pool = Arc::new(ConnectionPool::new(memc_timeout));
    let pipeline = FilePipeline::new(config.clone(), Arc::clone(shard_map), pool);
    join_set.spawn(async move { pipeline.run(&path).await });
}

/// Expand the glob pattern into a lexically sorted work list
///
/// Dot-prefixed names are always skipped: they are this loader's own
/// completion markers.
fn discover_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).context("invalid input pattern")?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable glob entry");
                None
            }
        })
        .filter(|path| path.is_file() && !is_marked(path))
        .collect();

    files.sort();
    Ok(files)
}

/// Check for the completion-marker prefix
fn is_marked(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Rename `dir/name` to `dir/.name` to mark the file as processed
///
/// Same-directory rename, hence atomic on any reasonable filesystem.
/// Failure is logged, not fatal: the worst case is reprocessing the file
/// on a future run.
fn mark_processed(path: &Path) {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        tracing::error!(path = %path.display(), "cannot derive marker name");
        return;
    };
    let target = path.with_file_name(format!(".{name}"));

    match std::fs::rename(path, &target) {
        Ok(()) => {
            tracing::info!(from = %path.display(), to = %target.display(), "file marked processed");
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to mark file processed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_marked() {
        assert!(is_marked(Path::new("/data/.done.tsv.gz")));
        assert!(!is_marked(Path::new("/data/pending.tsv.gz")));
    }
}
