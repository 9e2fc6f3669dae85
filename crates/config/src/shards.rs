//! Shard assignment configuration

use std::collections::BTreeMap;

use serde::Deserialize;

/// Device-type → shard-address assignments
///
/// Deserialized from a flat TOML table:
///
/// ```toml
/// [shards]
/// idfa = "127.0.0.1:33013"
/// gaid = "127.0.0.1:33014"
/// ```
///
/// Specifying the section replaces the default assignments entirely.
/// A `BTreeMap` keeps iteration (and thus startup logging) deterministic.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ShardsConfig {
    /// The raw assignments
    pub map: BTreeMap<String, String>,
}

impl Default for ShardsConfig {
    fn default() -> Self {
        Self {
            map: BTreeMap::from([
                ("idfa".into(), "127.0.0.1:33013".into()),
                ("gaid".into(), "127.0.0.1:33014".into()),
                ("adid".into(), "127.0.0.1:33015".into()),
                ("dvid".into(), "127.0.0.1:33016".into()),
            ]),
        }
    }
}

impl ShardsConfig {
    /// Override one device type's address (CLI flags use this)
    pub fn set(&mut self, device_type: impl Into<String>, addr: impl Into<String>) {
        self.map.insert(device_type.into(), addr.into());
    }
}
