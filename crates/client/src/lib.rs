//! Memload - Client
//!
//! Memcached client and per-shard connection pool.
//!
//! # Design
//!
//! - [`MemcClient`]: one TCP connection speaking the memcached text
//!   protocol, with a fixed socket timeout applied to connect, write and
//!   read. `set` returns `Ok(bool)` for a server verdict and `Err` for
//!   transport problems - the writer treats both negatives the same way.
//! - [`CacheStore`]: the trait seam the writer retries against. Tests mock
//!   it to script failures without a server.
//! - [`ConnectionPool`]: per-address queues of idle clients behind one
//!   map-level lock. Check-out/check-in is the only synchronization per
//!   handle; a handle is never held by two workers at once.
//!
//! # Example
//!
//! ```ignore
//! use memload_client::{CacheStore, ConnectionPool, ConnectionProvider};
//! use std::time::Duration;
//!
//! let pool = ConnectionPool::new(Duration::from_secs(15));
//! let mut conn = pool.acquire("127.0.0.1:33013").await?;
//! let stored = conn.set("idfa:abc123", b"payload").await?;
//! pool.release("127.0.0.1:33013", conn).await;
//! ```

mod client;
mod error;
mod pool;

pub use client::MemcClient;
pub use error::{ClientError, Result};
pub use pool::{ConnectionPool, PoolSnapshot};

use async_trait::async_trait;

/// A connection that can store one key/value pair
///
/// `Ok(true)` means the server acknowledged the write, `Ok(false)` means
/// the server refused it (e.g. `NOT_STORED`), `Err` means the transport
/// failed. Callers treat `Ok(false)` and `Err` as the same failure signal.
#[async_trait]
pub trait CacheStore: Send {
    /// Store `value` under `key`
    async fn set(&mut self, key: &str, value: &[u8]) -> Result<bool>;
}

/// Source of pooled cache connections, keyed by shard address
///
/// Implemented by [`ConnectionPool`] for production and by scripted mocks
/// in the pipeline tests.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Concrete connection type handed to workers
    type Conn: CacheStore + Send;

    /// Check out a connection for `addr`, creating one if none is idle
    async fn acquire(&self, addr: &str) -> Result<Self::Conn>;

    /// Return a connection to the idle pool, regardless of write outcome
    async fn release(&self, addr: &str, conn: Self::Conn);
}

#[cfg(test)]
mod client_test;
