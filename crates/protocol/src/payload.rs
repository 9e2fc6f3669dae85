//! Compact binary payload codec
//!
//! The value written to the cache for each record is a protobuf-encoded
//! [`DeviceApps`] message. Field numbers are fixed by the existing readers:
//! lat=1 (double), lon=2 (double), apps=3 (repeated uint32).

use prost::Message;

use crate::error::ProtocolError;
use crate::record::AppsInstalled;

/// Wire message for one device's installed apps
#[derive(Clone, PartialEq, Message)]
pub struct DeviceApps {
    /// Device latitude
    #[prost(double, tag = "1")]
    pub lat: f64,

    /// Device longitude
    #[prost(double, tag = "2")]
    pub lon: f64,

    /// Installed application ids
    #[prost(uint32, repeated, tag = "3")]
    pub apps: Vec<u32>,
}

impl DeviceApps {
    /// Build the wire message for a parsed record
    pub fn from_record(record: &AppsInstalled) -> Self {
        Self {
            lat: record.lat,
            lon: record.lon,
            apps: record.apps.clone(),
        }
    }

    /// Encode to protobuf wire bytes
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decode from protobuf wire bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] when the bytes are not a valid
    /// message.
    pub fn decode_from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self::decode(buf)?)
    }

    /// Verify that this message survives an encode/decode round trip
    ///
    /// Used by the `--test` self-check mode.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::RoundTripMismatch`] when the decoded
    /// message differs from the original.
    pub fn verify_round_trip(&self) -> Result<(), ProtocolError> {
        let decoded = Self::decode_from_bytes(&self.encode_to_bytes())?;
        if decoded != *self {
            return Err(ProtocolError::RoundTripMismatch);
        }
        Ok(())
    }
}
