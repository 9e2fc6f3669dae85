//! Per-shard connection pool
//!
//! Amortizes connection setup across the many writes one file produces.
//! One map-level lock guards the per-address idle queues; creating a new
//! connection happens outside the lock. A released handle always goes
//! back to the pool, even after a failed write - only the logical
//! operation is retried, never the connection itself.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::MemcClient;
use crate::error::Result;
use crate::ConnectionProvider;

/// Pool of idle memcached connections, keyed by shard address
///
/// Shared by all writer workers of one file pipeline. Sub-pools are
/// created lazily the first time a connection for an address is released;
/// everything is torn down implicitly when the pool is dropped.
pub struct ConnectionPool {
    /// Socket timeout applied to every new connection
    timeout: Duration,

    /// Idle handles per address
    idle: Mutex<HashMap<String, VecDeque<MemcClient>>>,

    /// Connections established (pool misses)
    created: AtomicU64,

    /// Connections handed out from the idle queue (pool hits)
    reused: AtomicU64,
}

impl ConnectionPool {
    /// Create an empty pool with the given socket timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            idle: Mutex::new(HashMap::new()),
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// Point-in-time usage counters
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
        }
    }

    /// Pop an idle connection for `addr`, if any
    fn pop_idle(&self, addr: &str) -> Option<MemcClient> {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.get_mut(addr).and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl ConnectionProvider for ConnectionPool {
    type Conn = MemcClient;

    /// Reuse an idle connection or establish a new one
    ///
    /// The idle lookup is near-zero wait (one lock probe); only a pool
    /// miss pays the connect cost.
    async fn acquire(&self, addr: &str) -> Result<MemcClient> {
        if let Some(conn) = self.pop_idle(addr) {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return Ok(conn);
        }

        let conn = MemcClient::connect(addr, self.timeout).await?;
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(conn)
    }

    /// Return a connection to the idle queue for its address
    async fn release(&self, addr: &str, conn: MemcClient) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.entry(addr.to_string()).or_default().push_back(conn);
    }
}

/// Point-in-time snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Connections established
    pub created: u64,
    /// Idle-queue handouts
    pub reused: u64,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        let idle_total: usize = idle.values().map(VecDeque::len).sum();
        f.debug_struct("ConnectionPool")
            .field("addresses", &idle.len())
            .field("idle_total", &idle_total)
            .finish()
    }
}
