//! Writer pool tests
//!
//! Driven through a scripted mock provider so no cache server is needed.
//! `MockProvider` is shared with the file pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use memload_client::{CacheStore, ClientError, ConnectionProvider};
use memload_protocol::AppsInstalled;
use tokio::sync::mpsc;

use crate::metrics::PipelineMetrics;
use crate::stats::LoadStats;
use crate::task::WriteTask;
use crate::worker::{WorkerConfig, WriterPool, write_with_retry};

/// Scripted connection: each `set` pops the next scripted verdict,
/// defaulting to success once the script runs dry.
pub(crate) struct MockStore {
    script: Arc<Mutex<VecDeque<Result<bool, ClientError>>>>,
    sets: Arc<AtomicU64>,
}

#[async_trait]
impl CacheStore for MockStore {
    async fn set(&mut self, _key: &str, _value: &[u8]) -> Result<bool, ClientError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(true))
    }
}

/// Provider handing out scripted connections and counting lifecycle calls
pub(crate) struct MockProvider {
    script: Arc<Mutex<VecDeque<Result<bool, ClientError>>>>,
    pub(crate) sets: Arc<AtomicU64>,
    pub(crate) acquires: Arc<AtomicU64>,
    pub(crate) releases: Arc<AtomicU64>,
    pub(crate) fail_acquire: bool,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub(crate) fn with_script(script: Vec<Result<bool, ClientError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            sets: Arc::new(AtomicU64::new(0)),
            acquires: Arc::new(AtomicU64::new(0)),
            releases: Arc::new(AtomicU64::new(0)),
            fail_acquire: false,
        }
    }

    pub(crate) fn failing_acquire() -> Self {
        Self {
            fail_acquire: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    type Conn = MockStore;

    async fn acquire(&self, addr: &str) -> Result<MockStore, ClientError> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquire {
            return Err(ClientError::timeout(addr, "connect"));
        }
        Ok(MockStore {
            script: Arc::clone(&self.script),
            sets: Arc::clone(&self.sets),
        })
    }

    async fn release(&self, _addr: &str, _conn: MockStore) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_record(device_id: &str) -> AppsInstalled {
    AppsInstalled {
        device_type: "idfa".into(),
        device_id: device_id.into(),
        lat: 55.55,
        lon: 42.42,
        apps: vec![1, 2, 3],
    }
}

fn test_task(device_id: &str, dry_run: bool) -> WriteTask {
    WriteTask {
        addr: "127.0.0.1:33013".into(),
        record: test_record(device_id),
        dry_run,
    }
}

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        retries: 1,
        backoff_factor: 0.0,
        poll_timeout: Duration::from_secs(1),
    }
}

/// Run `workers` over `tasks` and return the summed tallies.
async fn run_pool(
    provider: Arc<MockProvider>,
    config: WorkerConfig,
    workers: usize,
    tasks: Vec<WriteTask>,
) -> (LoadStats, crate::metrics::MetricsSnapshot) {
    let metrics = Arc::new(PipelineMetrics::new());
    let (task_tx, task_rx) = crossfire::mpmc::bounded_async(tasks.len().max(1));
    let (result_tx, mut result_rx) = mpsc::channel(workers + 1);

    for task in tasks {
        task_tx.send(task).await.unwrap();
    }
    drop(task_tx);

    let pool = WriterPool::new(config, provider, Arc::clone(&metrics));
    let handles = pool.spawn(workers, task_rx, result_tx);

    for handle in handles {
        handle.await.unwrap();
    }

    let mut total = LoadStats::default();
    while let Some(tally) = result_rx.recv().await {
        total.merge(tally);
    }
    (total, metrics.snapshot())
}

#[tokio::test]
async fn test_pool_conserves_tasks() {
    // K tasks, N workers, no induced failures: processed == K exactly,
    // no lost or duplicated tasks.
    let provider = Arc::new(MockProvider::new());
    let tasks: Vec<WriteTask> = (0..100).map(|i| test_task(&format!("dev{i}"), false)).collect();

    let (stats, _) = run_pool(Arc::clone(&provider), fast_config(), 4, tasks).await;

    assert_eq!(stats.processed, 100);
    assert_eq!(stats.errors, 0);
    assert_eq!(provider.sets.load(Ordering::SeqCst), 100);
    assert_eq!(
        provider.acquires.load(Ordering::SeqCst),
        provider.releases.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_pool_conserves_tasks_single_worker() {
    let provider = Arc::new(MockProvider::new());
    let tasks: Vec<WriteTask> = (0..10).map(|i| test_task(&format!("dev{i}"), false)).collect();

    let (stats, _) = run_pool(provider, fast_config(), 1, tasks).await;

    assert_eq!(stats.processed, 10);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_retry_then_success() {
    // A client that fails once then succeeds: exactly one retry, success
    // tally, never an error tally.
    let provider = Arc::new(MockProvider::with_script(vec![Ok(false), Ok(true)]));

    let (stats, metrics) = run_pool(
        Arc::clone(&provider),
        fast_config(),
        1,
        vec![test_task("dev1", false)],
    )
    .await;

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(provider.sets.load(Ordering::SeqCst), 2);
    assert_eq!(metrics.retries, 1);
}

#[tokio::test]
async fn test_transport_error_then_success() {
    let provider = Arc::new(MockProvider::with_script(vec![
        Err(ClientError::Protocol {
            response: "SERVER_ERROR".into(),
        }),
        Ok(true),
    ]));

    let (stats, _) = run_pool(
        Arc::clone(&provider),
        fast_config(),
        1,
        vec![test_task("dev1", false)],
    )
    .await;

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_failure_after_exhausted_retries() {
    let provider = Arc::new(MockProvider::with_script(vec![Ok(false), Ok(false)]));

    let (stats, metrics) = run_pool(
        Arc::clone(&provider),
        fast_config(),
        1,
        vec![test_task("dev1", false)],
    )
    .await;

    assert_eq!(stats.processed, 0);
    assert_eq!(stats.errors, 1);
    // retries budget of 1 means two attempts total
    assert_eq!(provider.sets.load(Ordering::SeqCst), 2);
    assert_eq!(metrics.write_errors, 1);
    // Connection goes back to the pool even after the failure.
    assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_acquire_failure_counts_as_error() {
    let provider = Arc::new(MockProvider::failing_acquire());

    let (stats, _) = run_pool(
        Arc::clone(&provider),
        fast_config(),
        1,
        vec![test_task("dev1", false)],
    )
    .await;

    assert_eq!(stats.processed, 0);
    assert_eq!(stats.errors, 1);
    assert_eq!(provider.releases.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dry_run_skips_network() {
    // Even a provider that cannot connect succeeds in dry-run mode:
    // the write path is never entered.
    let provider = Arc::new(MockProvider::failing_acquire());

    let (stats, _) = run_pool(
        Arc::clone(&provider),
        fast_config(),
        2,
        vec![test_task("dev1", true), test_task("dev2", true)],
    )
    .await;

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.errors, 0);
    assert_eq!(provider.acquires.load(Ordering::SeqCst), 0);
    assert_eq!(provider.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_workers_exit_on_idle_timeout() {
    // Queue kept open but empty: workers must exit after the poll timeout
    // and still push their (0, 0) tallies.
    let provider = Arc::new(MockProvider::new());
    let metrics = Arc::new(PipelineMetrics::new());
    let (task_tx, task_rx) = crossfire::mpmc::bounded_async::<WriteTask>(4);
    let (result_tx, mut result_rx) = mpsc::channel(3);

    let config = WorkerConfig {
        poll_timeout: Duration::from_millis(50),
        ..fast_config()
    };
    let pool = WriterPool::new(config, provider, metrics);
    let handles = pool.spawn(2, task_rx, result_tx);

    for handle in handles {
        handle.await.unwrap();
    }
    drop(task_tx);

    let mut tallies = 0;
    while let Some(tally) = result_rx.recv().await {
        assert_eq!(tally, LoadStats::default());
        tallies += 1;
    }
    assert_eq!(tallies, 2);
}

#[tokio::test]
async fn test_write_with_retry_attempt_count() {
    let provider = MockProvider::with_script(vec![Ok(false), Err(ClientError::Protocol {
        response: "ERROR".into(),
    })]);
    let mut conn = provider.acquire("127.0.0.1:33013").await.unwrap();

    // retries=2 allows three attempts; the third succeeds (script is dry).
    let (ok, attempts) = write_with_retry(&mut conn, "k", b"v", 2, 0.0).await;
    assert!(ok);
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_write_with_retry_zero_budget() {
    let provider = MockProvider::with_script(vec![Ok(false)]);
    let mut conn = provider.acquire("127.0.0.1:33013").await.unwrap();

    let (ok, attempts) = write_with_retry(&mut conn, "k", b"v", 0, 0.0).await;
    assert!(!ok);
    assert_eq!(attempts, 1);
}
