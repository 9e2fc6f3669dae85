//! Domain record for one parsed input line

/// One device's installed-apps record
///
/// Built by [`parse_line`](crate::parse_line) from a single input line and
/// consumed exactly once by a writer worker. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppsInstalled {
    /// Device type (e.g. "idfa", "gaid") - selects the target shard
    pub device_type: String,

    /// Opaque device identifier
    pub device_id: String,

    /// Latitude, `0.0` when the input coordinate was unparseable
    pub lat: f64,

    /// Longitude, `0.0` when the input coordinate was unparseable
    pub lon: f64,

    /// Installed application ids, in input order
    pub apps: Vec<u32>,
}

impl AppsInstalled {
    /// Cache key for this record: `"{device_type}:{device_id}"`
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.device_type, self.device_id)
    }
}
