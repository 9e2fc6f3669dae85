//! Client error types

use std::io;

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from the memcached client
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connect failed
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// Shard address
        addr: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Operation exceeded the socket timeout
    #[error("{op} to {addr} timed out")]
    Timeout {
        /// Shard address
        addr: String,
        /// Operation name ("connect", "set")
        op: &'static str,
    },

    /// Server closed the connection mid-operation
    #[error("connection to {addr} closed by server")]
    ConnectionClosed {
        /// Shard address
        addr: String,
    },

    /// Server replied with something outside the protocol
    #[error("unexpected server response: {response}")]
    Protocol {
        /// First response line, trimmed
        response: String,
    },

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Create a Timeout error
    pub fn timeout(addr: impl Into<String>, op: &'static str) -> Self {
        Self::Timeout {
            addr: addr.into(),
            op,
        }
    }
}
