//! Pipeline error types
//!
//! Only file-level problems surface here; per-record and per-write
//! failures are recovered locally and folded into counters.

use std::io;

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file could not be opened
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Input file path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Reading the input stream failed mid-file (e.g. gzip corruption)
    #[error("read error in '{path}': {source}")]
    Read {
        /// Input file path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A writer worker panicked
    #[error("writer worker failed: {0}")]
    Worker(String),
}
