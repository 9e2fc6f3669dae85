//! Unit of work placed on the task queue

use memload_protocol::AppsInstalled;

/// One pending cache write
///
/// Built by the parser after shard routing succeeds. Ownership moves from
/// the parser to whichever writer worker dequeues it.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteTask {
    /// Target shard address
    pub addr: String,

    /// The record to serialize and store
    pub record: AppsInstalled,

    /// When set, the write is logged instead of performed
    pub dry_run: bool,
}
