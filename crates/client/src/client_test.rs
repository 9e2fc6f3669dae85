//! Client and pool tests against an in-process fake memcached server

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::{CacheStore, ConnectionPool, ConnectionProvider, MemcClient};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Spawn a fake memcached server that answers every `set` with `response`.
///
/// Returns the server address and a counter of accepted connections.
async fn spawn_fake_server(response: &'static str) -> (String, Arc<AtomicU64>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let accepted = Arc::new(AtomicU64::new(0));

    let accepted_clone = Arc::clone(&accepted);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            accepted_clone.fetch_add(1, Ordering::SeqCst);

            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut reader = BufReader::new(read_half);
                loop {
                    let mut header = String::new();
                    let Ok(n) = reader.read_line(&mut header).await else {
                        break;
                    };
                    if n == 0 {
                        break;
                    }

                    // "set <key> <flags> <exptime> <bytes>"
                    let bytes: usize = header
                        .trim_end()
                        .rsplit(' ')
                        .next()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);

                    // Drain the data block plus trailing CRLF.
                    let mut data = vec![0u8; bytes + 2];
                    if reader.read_exact(&mut data).await.is_err() {
                        break;
                    }

                    if write_half
                        .write_all(format!("{}\r\n", response).as_bytes())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
    });

    (addr, accepted)
}

#[tokio::test]
async fn test_set_stored() {
    let (addr, _) = spawn_fake_server("STORED").await;

    let mut client = MemcClient::connect(&addr, TEST_TIMEOUT).await.unwrap();
    let stored = client.set("idfa:dev1", b"payload").await.unwrap();
    assert!(stored);
}

#[tokio::test]
async fn test_set_not_stored() {
    let (addr, _) = spawn_fake_server("NOT_STORED").await;

    let mut client = MemcClient::connect(&addr, TEST_TIMEOUT).await.unwrap();
    let stored = client.set("idfa:dev1", b"payload").await.unwrap();
    assert!(!stored);
}

#[tokio::test]
async fn test_set_server_error() {
    let (addr, _) = spawn_fake_server("SERVER_ERROR out of memory").await;

    let mut client = MemcClient::connect(&addr, TEST_TIMEOUT).await.unwrap();
    let err = client.set("idfa:dev1", b"payload").await.unwrap_err();
    assert!(err.to_string().contains("out of memory"));
}

#[tokio::test]
async fn test_set_binary_payload() {
    let (addr, _) = spawn_fake_server("STORED").await;

    let mut client = MemcClient::connect(&addr, TEST_TIMEOUT).await.unwrap();
    // Payload containing CRLF must survive the framing.
    let stored = client.set("k", b"\x00\r\n\xff\x01").await.unwrap();
    assert!(stored);
}

#[tokio::test]
async fn test_connect_refused() {
    // Bind-then-drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    assert!(MemcClient::connect(&addr, TEST_TIMEOUT).await.is_err());
}

#[tokio::test]
async fn test_pool_reuses_released_connection() {
    let (addr, accepted) = spawn_fake_server("STORED").await;
    let pool = ConnectionPool::new(TEST_TIMEOUT);

    let mut conn = pool.acquire(&addr).await.unwrap();
    conn.set("k", b"v").await.unwrap();
    pool.release(&addr, conn).await;

    let mut conn = pool.acquire(&addr).await.unwrap();
    conn.set("k2", b"v2").await.unwrap();
    pool.release(&addr, conn).await;

    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.created, 1);
    assert_eq!(snapshot.reused, 1);
}

#[tokio::test]
async fn test_pool_creates_when_empty() {
    let (addr, accepted) = spawn_fake_server("STORED").await;
    let pool = ConnectionPool::new(TEST_TIMEOUT);

    // Two concurrent check-outs cannot share a handle.
    let c1 = pool.acquire(&addr).await.unwrap();
    let c2 = pool.acquire(&addr).await.unwrap();
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    pool.release(&addr, c1).await;
    pool.release(&addr, c2).await;
}

#[tokio::test]
async fn test_pool_separate_addresses() {
    let (addr_a, accepted_a) = spawn_fake_server("STORED").await;
    let (addr_b, accepted_b) = spawn_fake_server("STORED").await;
    let pool = ConnectionPool::new(TEST_TIMEOUT);

    let conn_a = pool.acquire(&addr_a).await.unwrap();
    pool.release(&addr_a, conn_a).await;

    // Idle handle for A must not be handed out for B.
    let conn_b = pool.acquire(&addr_b).await.unwrap();
    pool.release(&addr_b, conn_b).await;

    assert_eq!(accepted_a.load(Ordering::SeqCst), 1);
    assert_eq!(accepted_b.load(Ordering::SeqCst), 1);
}
