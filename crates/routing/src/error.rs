//! Routing error types

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Routing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Device type has no shard assigned
    #[error("unknown device type: {0}")]
    UnknownDeviceType(String),
}
