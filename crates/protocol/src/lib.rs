//! Memload - Protocol
//!
//! Domain record, input-line parser and the compact binary payload codec.
//!
//! # Input format
//!
//! One record per line, tab-separated, optionally inside a gzip stream:
//!
//! ```text
//! device_type<TAB>device_id<TAB>lat<TAB>lon<TAB>app_id[,app_id...]
//! ```
//!
//! # Error asymmetry
//!
//! Structural problems (too few fields, empty ids) reject the line.
//! Data problems (non-numeric app ids, bad coordinates) degrade the record
//! and log a warning but still emit it. Callers count only the former.
//!
//! # Example
//!
//! ```
//! use memload_protocol::{parse_line, DeviceApps};
//!
//! let record = parse_line("idfa\tabc123\t55.55\t42.42\t1,2,3").unwrap();
//! assert_eq!(record.cache_key(), "idfa:abc123");
//!
//! let payload = DeviceApps::from_record(&record).encode_to_bytes();
//! let decoded = DeviceApps::decode_from_bytes(&payload).unwrap();
//! assert_eq!(decoded.apps, vec![1, 2, 3]);
//! ```

mod error;
mod parse;
mod payload;
mod record;

pub use error::{ParseError, ProtocolError, Result};
pub use parse::parse_line;
pub use payload::DeviceApps;
pub use record::AppsInstalled;
