//! Shard map for device-type → address lookup
//!
//! Compiled once from configuration. All allocations happen at build time,
//! the per-record lookup is a single HashMap probe returning a borrow.

use std::collections::HashMap;

use crate::error::RoutingError;

/// Fixed device-type → shard-address mapping
///
/// # Example
///
/// ```
/// use memload_routing::ShardMap;
///
/// let map = ShardMap::from_iter([
///     ("idfa", "127.0.0.1:33013"),
///     ("gaid", "127.0.0.1:33014"),
/// ]);
///
/// assert_eq!(map.route("gaid").unwrap(), "127.0.0.1:33014");
/// assert_eq!(map.shard_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShardMap {
    shards: HashMap<String, String>,
}

impl ShardMap {
    /// Create an empty shard map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a shard address to a device type
    ///
    /// Replaces any previous assignment for the same type.
    pub fn insert(&mut self, device_type: impl Into<String>, addr: impl Into<String>) {
        self.shards.insert(device_type.into(), addr.into());
    }

    /// Resolve the shard address for a device type
    ///
    /// This is the hot path: one HashMap probe, returns a borrowed address.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::UnknownDeviceType`] when the type has no
    /// shard assigned. Callers count this as an error and drop the record
    /// without enqueuing it.
    #[inline]
    pub fn route(&self, device_type: &str) -> Result<&str, RoutingError> {
        self.shards
            .get(device_type)
            .map(String::as_str)
            .ok_or_else(|| RoutingError::UnknownDeviceType(device_type.to_string()))
    }

    /// Check whether a device type has a shard assigned
    #[inline]
    pub fn contains(&self, device_type: &str) -> bool {
        self.shards.contains_key(device_type)
    }

    /// Number of configured shards
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Check if no shards are configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Iterate over (device_type, address) pairs
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.shards.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ShardMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            shards: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
