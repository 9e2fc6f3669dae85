//! Per-file pipeline
//!
//! Runs one parser over one (optionally gzip-compressed) input file,
//! feeding a fixed-size writer pool through a bounded task queue, then
//! aggregates the tallies and applies the error-rate policy.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use memload_client::ConnectionProvider;
use memload_protocol::parse_line;
use memload_routing::ShardMap;
use tokio::sync::mpsc;

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::stats::{LoadOutcome, LoadStats};
use crate::task::WriteTask;
use crate::worker::{WorkerConfig, WriterPool};
use crate::{DEFAULT_ERROR_RATE_THRESHOLD, DEFAULT_TASK_QUEUE_SIZE, DEFAULT_WORKERS_PER_FILE};

/// Knobs for one file pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Writer workers per file
    pub workers: usize,

    /// Capacity of the bounded task queue
    pub task_queue_size: usize,

    /// Worker retry/termination settings
    pub worker: WorkerConfig,

    /// Error-rate threshold for the success/failure log
    pub error_rate_threshold: f64,

    /// Log writes instead of performing them
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS_PER_FILE,
            task_queue_size: DEFAULT_TASK_QUEUE_SIZE,
            worker: WorkerConfig::default(),
            error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD,
            dry_run: false,
        }
    }
}

/// Result of one file's processing
///
/// Returned to the batch driver for completion marking whatever the
/// outcome was.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// The input file, echoed back for the rename step
    pub path: PathBuf,

    /// Summed tallies from the parser and every worker
    pub stats: LoadStats,

    /// Verdict against the error-rate threshold
    pub outcome: LoadOutcome,
}

/// One file's full processing: parser → task queue → writer pool
pub struct FilePipeline<P> {
    config: PipelineConfig,
    shard_map: Arc<ShardMap>,
    provider: Arc<P>,
}

impl<P> FilePipeline<P>
where
    P: ConnectionProvider + 'static,
{
    /// Create a pipeline over the given shard map and connection provider
    pub fn new(config: PipelineConfig, shard_map: Arc<ShardMap>, provider: Arc<P>) -> Self {
        Self {
            config,
            shard_map,
            provider,
        }
    }

    /// Process one input file to completion
    ///
    /// Malformed lines and unknown device types increment the parser's own
    /// error counter and never reach the queue. Write failures are counted
    /// by the workers. Either way the file is reported back for completion
    /// marking.
    ///
    /// # Errors
    ///
    /// Only file-level problems (unreadable input, worker panic) surface
    /// as errors.
    pub async fn run(&self, path: &Path) -> Result<FileReport> {
        tracing::info!(path = %path.display(), "processing file");
        let metrics = Arc::new(PipelineMetrics::new());

        let (task_tx, task_rx) = crossfire::mpmc::bounded_async(self.config.task_queue_size);
        let (result_tx, mut result_rx) = mpsc::channel(self.config.workers + 1);

        let pool = WriterPool::new(
            self.config.worker,
            Arc::clone(&self.provider),
            Arc::clone(&metrics),
        );
        let handles = pool.spawn(self.config.workers, task_rx, result_tx.clone());

        let parse_errors = self
            .parse_into_queue(path, &task_tx, &metrics)
            .await?;

        // Closing the queue lets drained workers exit without waiting out
        // the poll timeout.
        drop(task_tx);

        let parser_stats = LoadStats {
            processed: 0,
            errors: parse_errors,
        };
        if result_tx.try_send(parser_stats).is_err() {
            tracing::error!("result queue full, parser tally lost");
        }
        drop(result_tx);

        for handle in handles {
            handle
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))?;
        }

        let mut stats = LoadStats::default();
        while let Some(tally) = result_rx.recv().await {
            stats.merge(tally);
        }

        let outcome = stats.outcome(self.config.error_rate_threshold);
        match outcome {
            LoadOutcome::NoRecords => {
                tracing::info!(
                    path = %path.display(),
                    errors = stats.errors,
                    "no records processed, did you forget to start a memcached server?"
                );
            }
            LoadOutcome::Acceptable(rate) => {
                tracing::info!(
                    path = %path.display(),
                    error_rate = rate,
                    "acceptable error rate, successful load"
                );
            }
            LoadOutcome::High(rate) => {
                tracing::error!(
                    path = %path.display(),
                    error_rate = rate,
                    threshold = self.config.error_rate_threshold,
                    "high error rate, failed load"
                );
            }
        }

        let snapshot = metrics.snapshot();
        tracing::info!(
            path = %path.display(),
            lines_read = snapshot.lines_read,
            parse_errors = snapshot.parse_errors,
            routing_errors = snapshot.routing_errors,
            tasks_enqueued = snapshot.tasks_enqueued,
            writes_ok = snapshot.writes_ok,
            write_errors = snapshot.write_errors,
            retries = snapshot.retries,
            "file pipeline finished"
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            stats,
            outcome,
        })
    }

    /// Run the parser over the file, enqueuing routed records
    ///
    /// Returns the parser-owned error count (structural rejects plus
    /// unknown shards).
    async fn parse_into_queue(
        &self,
        path: &Path,
        task_tx: &crossfire::MAsyncTx<WriteTask>,
        metrics: &PipelineMetrics,
    ) -> Result<u64> {
        let reader = open_input(path)?;
        let mut errors = 0u64;

        for line in reader.lines() {
            let line = line.map_err(|e| PipelineError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            metrics.record_line();

            let record = match parse_line(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(error = %e, "dropping malformed line");
                    errors += 1;
                    metrics.record_parse_error();
                    continue;
                }
            };

            let addr = match self.shard_map.route(&record.device_type) {
                Ok(addr) => addr.to_string(),
                Err(e) => {
                    tracing::error!(error = %e, "dropping record");
                    errors += 1;
                    metrics.record_routing_error();
                    continue;
                }
            };

            let task = WriteTask {
                addr,
                record,
                dry_run: self.config.dry_run,
            };

            // Blocking send: a full queue is backpressure on the parser.
            // A closed queue means every worker already hit its idle
            // timeout; the rest of the file is lost (known approximation).
            if task_tx.send(task).await.is_err() {
                tracing::warn!(
                    path = %path.display(),
                    "all writers exited before parsing finished, remaining lines lost"
                );
                break;
            }
            metrics.record_task_enqueued();
        }

        Ok(errors)
    }
}

/// Open an input file, transparently decoding `.gz`
fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| PipelineError::Open {
        path: path.display().to_string(),
        source: e,
    })?;

    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
