//! Protocol error types

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Structural parse failures
///
/// A line that produces one of these is dropped and counted as an error
/// by the caller. Soft data problems (bad geo, non-numeric app ids) are
/// not represented here - they degrade the record instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line has fewer than the five required tab-separated fields
    #[error("expected 5 tab-separated fields, found {found}")]
    TooFewFields {
        /// Number of fields actually present
        found: usize,
    },

    /// Device type field is empty
    #[error("empty device type")]
    EmptyDeviceType,

    /// Device id field is empty
    #[error("empty device id")]
    EmptyDeviceId,
}

/// Errors from the protocol crate
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line could not be parsed into a record
    #[error("malformed input line: {0}")]
    Parse(#[from] ParseError),

    /// Payload bytes are not a valid DeviceApps message
    #[error("payload decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Round-trip self-check produced a different message
    #[error("payload round-trip mismatch")]
    RoundTripMismatch,
}
