//! Memload - Pipeline
//!
//! Per-file processing: one parser feeding a bounded task queue drained by
//! a pool of writer workers.
//!
//! # Architecture
//!
//! ```text
//! [Parser]                        [Task queue]            [Writers]
//!   file ──→ parse ──→ route ──→ bounded MPMC ──┬──→ worker ──→ pool ──→ memcached
//!            (errors counted       (backpressure ├──→ worker ──→ pool ──→ memcached
//!             locally)              on send)     └──→ worker ──→ pool ──→ memcached
//!                                                        │
//!                     [Result queue] ←── (processed, errors) tallies
//! ```
//!
//! # Key Design
//!
//! - **Bounded MPMC task queue**: the single synchronization point between
//!   the parser and the workers; a full queue blocks the parser.
//! - **Idle-timeout termination**: a worker exits after the queue stays
//!   empty for the poll timeout. This is a best-effort completion signal,
//!   not a barrier - see the `worker` module docs.
//! - **Local failure recovery**: every per-record and per-write failure is
//!   folded into counters; nothing below the file level propagates.
//! - **Outcome policy**: the per-file error rate only drives a
//!   success/failure log line, never a retry.

mod error;
mod file;
mod metrics;
mod stats;
mod task;
mod worker;

pub use error::{PipelineError, Result};
pub use file::{FilePipeline, FileReport, PipelineConfig};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use stats::{LoadOutcome, LoadStats};
pub use task::WriteTask;
pub use worker::{WorkerConfig, WriterPool, write_with_retry};

/// Default writer workers per file
pub const DEFAULT_WORKERS_PER_FILE: usize = 5;

/// Default capacity of the bounded task queue
pub const DEFAULT_TASK_QUEUE_SIZE: usize = 1024;

/// Default error-rate threshold for the success/failure log
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.01;

#[cfg(test)]
mod worker_test;
