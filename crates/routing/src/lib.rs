//! Memload - Routing
//!
//! Device-type → shard-address mapping, compiled once at startup.
//! Zero-copy design: `route()` returns a borrowed address, no allocation
//! in the hot path.
//!
//! # Design
//!
//! Shard selection happens once per record, before it reaches the task
//! queue. The map is fixed for the lifetime of a run; a device type either
//! resolves to exactly one address or is an unknown-shard error that the
//! caller counts and drops.
//!
//! # Example
//!
//! ```
//! use memload_routing::ShardMap;
//!
//! let map = ShardMap::from_iter([("idfa", "127.0.0.1:33013")]);
//!
//! assert_eq!(map.route("idfa").unwrap(), "127.0.0.1:33013");
//! assert!(map.route("watch").is_err());
//! ```

mod error;
mod shard_map;

pub use error::{Result, RoutingError};
pub use shard_map::ShardMap;
