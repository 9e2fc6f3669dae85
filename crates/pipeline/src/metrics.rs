//! Per-pipeline metrics
//!
//! Observability counters, separate from [`LoadStats`](crate::LoadStats):
//! these are logged at file completion and never influence the outcome
//! policy.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the parser and all writer workers of one file
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Non-blank lines read from the input
    lines_read: AtomicU64,

    /// Lines rejected for structural reasons
    parse_errors: AtomicU64,

    /// Records dropped because the device type had no shard
    routing_errors: AtomicU64,

    /// Tasks placed on the queue
    tasks_enqueued: AtomicU64,

    /// Successful writes (including dry-run)
    writes_ok: AtomicU64,

    /// Writes that failed after exhausting retries
    write_errors: AtomicU64,

    /// Retry attempts performed (not counting first attempts)
    retries: AtomicU64,
}

impl PipelineMetrics {
    /// Create a zeroed metrics block
    pub const fn new() -> Self {
        Self {
            lines_read: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            routing_errors: AtomicU64::new(0),
            tasks_enqueued: AtomicU64::new(0),
            writes_ok: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_routing_error(&self) {
        self.routing_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_task_enqueued(&self) {
        self.tasks_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_ok(&self) {
        self.writes_ok.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retries(&self, count: u64) {
        self.retries.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            routing_errors: self.routing_errors.load(Ordering::Relaxed),
            tasks_enqueued: self.tasks_enqueued.load(Ordering::Relaxed),
            writes_ok: self.writes_ok.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub parse_errors: u64,
    pub routing_errors: u64,
    pub tasks_enqueued: u64,
    pub writes_ok: u64,
    pub write_errors: u64,
    pub retries: u64,
}
