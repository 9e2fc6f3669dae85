//! Memcached text-protocol client
//!
//! One TCP connection per client. Only the `set` command is implemented -
//! the loader never reads back. The socket timeout covers connect, the
//! full command write and the response read individually.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time;

use crate::error::{ClientError, Result};
use crate::CacheStore;

/// Memcached client over one TCP connection
///
/// Created by [`ConnectionPool`](crate::ConnectionPool) on demand and
/// reused across writes. Not cloneable; exactly one worker holds a client
/// at a time.
pub struct MemcClient {
    addr: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl MemcClient {
    /// Connect to a shard address with the given socket timeout
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] when the connect exceeds the
    /// timeout and [`ClientError::Connect`] on a refused/failed connect.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::timeout(addr, "connect"))?
            .map_err(|e| ClientError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;

        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        tracing::debug!(addr, "memcached connection established");

        Ok(Self {
            addr: addr.to_string(),
            reader: BufReader::new(read_half),
            writer: write_half,
            timeout,
        })
    }

    /// Address this client is connected to
    #[inline]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl CacheStore for MemcClient {
    /// Issue `set <key> 0 0 <len>` and wait for the verdict line
    ///
    /// `STORED` maps to `Ok(true)`; the other documented verdicts map to
    /// `Ok(false)`. Anything else is a protocol error.
    async fn set(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        let header = format!("set {} 0 0 {}\r\n", key, value.len());

        let write = async {
            self.writer.write_all(header.as_bytes()).await?;
            self.writer.write_all(value).await?;
            self.writer.write_all(b"\r\n").await?;
            self.writer.flush().await
        };
        time::timeout(self.timeout, write)
            .await
            .map_err(|_| ClientError::timeout(&self.addr, "set"))??;

        let mut line = String::new();
        let n = time::timeout(self.timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| ClientError::timeout(&self.addr, "set"))??;
        if n == 0 {
            return Err(ClientError::ConnectionClosed {
                addr: self.addr.clone(),
            });
        }

        match line.trim_end() {
            "STORED" => Ok(true),
            "NOT_STORED" | "EXISTS" | "NOT_FOUND" => Ok(false),
            other => Err(ClientError::Protocol {
                response: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for MemcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcClient")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .finish()
    }
}
