//! Writer worker pool
//!
//! N workers drain one bounded MPMC task queue. Each task is one cache
//! write: acquire a pooled connection for the task's shard, serialize the
//! record, `set` with a bounded retry/backoff schedule, release the
//! connection whatever happened, tally the outcome.
//!
//! # Termination
//!
//! A worker exits when the queue stays empty for the poll timeout, or as
//! soon as the queue is closed and drained. The idle timeout is a
//! best-effort completion signal inherited from the original design, not
//! a barrier: under heavy load a slow worker pool can in principle go
//! idle before the parser has finished enqueuing, losing the tail of the
//! file. The parser observes this as a closed queue and logs it.

use std::sync::Arc;
use std::time::Duration;

use memload_client::{CacheStore, ConnectionProvider};
use memload_protocol::DeviceApps;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::metrics::PipelineMetrics;
use crate::stats::LoadStats;
use crate::task::WriteTask;

/// Retry and termination knobs for one worker pool
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    /// Additional attempts after a failed write
    pub retries: u32,

    /// Base backoff in seconds; attempt N sleeps `backoff_factor * 2^N`
    pub backoff_factor: f64,

    /// How long a worker waits on an empty queue before exiting
    pub poll_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            backoff_factor: 1.0,
            poll_timeout: Duration::from_secs(1),
        }
    }
}

/// Pool of writer workers over one task queue
///
/// The provider is shared by all workers; connections are checked out per
/// task and always checked back in.
pub struct WriterPool<P> {
    config: WorkerConfig,
    provider: Arc<P>,
    metrics: Arc<PipelineMetrics>,
}

impl<P> WriterPool<P>
where
    P: ConnectionProvider + 'static,
{
    /// Create a pool sharing the given connection provider and metrics
    pub fn new(config: WorkerConfig, provider: Arc<P>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            config,
            provider,
            metrics,
        }
    }

    /// Spawn `count` workers draining `task_rx`
    ///
    /// Each worker pushes its final `(processed, errors)` tally onto
    /// `result_tx` with a non-blocking send before exiting; a full result
    /// queue loses the tally and logs an error, nothing more.
    pub fn spawn(
        &self,
        count: usize,
        task_rx: crossfire::MAsyncRx<WriteTask>,
        result_tx: mpsc::Sender<LoadStats>,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let config = self.config;
            let provider = Arc::clone(&self.provider);
            let metrics = Arc::clone(&self.metrics);
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();

            handles.push(tokio::spawn(async move {
                run_worker(worker_id, config, provider, metrics, task_rx, result_tx).await;
            }));
        }

        handles
    }
}

/// One worker's drain loop
async fn run_worker<P>(
    worker_id: usize,
    config: WorkerConfig,
    provider: Arc<P>,
    metrics: Arc<PipelineMetrics>,
    task_rx: crossfire::MAsyncRx<WriteTask>,
    result_tx: mpsc::Sender<LoadStats>,
) where
    P: ConnectionProvider,
{
    tracing::debug!(worker_id, "writer worker starting");
    let mut stats = LoadStats::default();

    loop {
        match time::timeout(config.poll_timeout, task_rx.recv()).await {
            Ok(Ok(task)) => {
                if handle_task(&*provider, &config, &metrics, task).await {
                    stats.processed += 1;
                    metrics.record_write_ok();
                } else {
                    stats.errors += 1;
                    metrics.record_write_error();
                }
            }
            // Queue closed and drained: the parser is done.
            Ok(Err(_)) => break,
            // Queue empty for the whole poll timeout: assume completion.
            Err(_) => break,
        }
    }

    if result_tx.try_send(stats).is_err() {
        tracing::error!(worker_id, "result queue full, worker tally lost");
    }

    tracing::debug!(
        worker_id,
        processed = stats.processed,
        errors = stats.errors,
        "writer worker exiting"
    );
}

/// Process one task; returns true on success
async fn handle_task<P>(
    provider: &P,
    config: &WorkerConfig,
    metrics: &PipelineMetrics,
    task: WriteTask,
) -> bool
where
    P: ConnectionProvider,
{
    let key = task.record.cache_key();
    let payload = DeviceApps::from_record(&task.record).encode_to_bytes();

    if task.dry_run {
        tracing::debug!(
            addr = %task.addr,
            key = %key,
            lat = task.record.lat,
            lon = task.record.lon,
            apps = task.record.apps.len(),
            payload_bytes = payload.len(),
            "dry run, skipping write"
        );
        return true;
    }

    let mut conn = match provider.acquire(&task.addr).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(addr = %task.addr, error = %e, "cannot reach cache server");
            return false;
        }
    };

    let (ok, attempts) = write_with_retry(
        &mut conn,
        &key,
        &payload,
        config.retries,
        config.backoff_factor,
    )
    .await;

    // Back to the pool even after a failed write; only the logical
    // operation is retried, never the connection.
    provider.release(&task.addr, conn).await;

    if attempts > 1 {
        metrics.record_retries(u64::from(attempts) - 1);
    }

    ok
}

/// Attempt a `set` with bounded retries and exponential backoff
///
/// A `false` verdict and a transport error are the same failure signal.
/// Attempt N (zero-based) is followed by a `backoff_factor * 2^N` second
/// sleep when more attempts remain. Returns the final verdict and the
/// number of attempts made.
pub async fn write_with_retry<C>(
    conn: &mut C,
    key: &str,
    value: &[u8],
    retries: u32,
    backoff_factor: f64,
) -> (bool, u32)
where
    C: CacheStore + ?Sized,
{
    let mut attempts = 0;

    for attempt in 0..=retries {
        attempts += 1;
        match conn.set(key, value).await {
            Ok(true) => return (true, attempts),
            Ok(false) => {
                tracing::warn!(key = %key, attempt, "cache server refused write");
            }
            Err(e) => {
                tracing::warn!(key = %key, attempt, error = %e, "cache write failed");
            }
        }

        if attempt < retries {
            let delay = Duration::from_secs_f64(backoff_factor * f64::powi(2.0, attempt as i32));
            time::sleep(delay).await;
        }
    }

    (false, attempts)
}
