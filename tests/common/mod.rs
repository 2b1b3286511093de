//! Common test utilities for driver integration tests
//!
//! [`FakeController`] listens on an ephemeral localhost port and behaves like
//! the controller's telnet server: it sends the 6-byte connect preamble,
//! records every command line (CR-terminated) and answers every query
//! (line ending in `?`) with one CR LF-terminated reply.

#![allow(dead_code)] // Utilities may not all be used by every test binary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use newfocus8743::config::ConnectionConfig;

/// Preamble the fake sends right after accept.
pub const PREAMBLE: &[u8; 6] = b"\xff\xfd\x03\xff\xfb\x01";

/// Maps a query line (without terminator, e.g. `"1MM?"`) to a reply payload.
pub type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// In-process stand-in for the controller's TCP server.
pub struct FakeController {
    port: u16,
    received: Arc<Mutex<Vec<String>>>,
    /// Queries that arrived while a previous reply was still owed
    overlaps: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeController {
    /// Start a fake that answers queries via `responder`.
    ///
    /// `reply_delay` is applied before each reply, to give a misbehaving
    /// client the chance to send its next command early.
    pub async fn start(responder: Responder, reply_delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let log = received.clone();
        let overlap_count = overlaps.clone();
        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = socket.into_split();
            write_half.write_all(PREAMBLE).await.unwrap();

            let mut reader = BufReader::new(read_half);
            loop {
                let mut raw = Vec::new();
                match reader.read_until(b'\r', &mut raw).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                let line = String::from_utf8_lossy(&raw).into_owned();
                log.lock().unwrap().push(line.clone());

                if line.ends_with('?') {
                    if !reply_delay.is_zero() {
                        tokio::time::sleep(reply_delay).await;
                    }
                    if !reader.buffer().is_empty() {
                        overlap_count.fetch_add(1, Ordering::SeqCst);
                    }
                    let reply = format!("{}\r\n", responder(&line));
                    if write_half.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            port,
            received,
            overlaps,
            handle,
        }
    }

    /// Start a fake answering from a fixed table; unknown queries get `"0"`.
    pub async fn with_replies(replies: &[(&str, &str)]) -> Self {
        let table: Vec<(String, String)> = replies
            .iter()
            .map(|(q, r)| (q.to_string(), r.to_string()))
            .collect();
        let responder: Responder = Arc::new(move |line: &str| {
            table
                .iter()
                .find(|(q, _)| q == line)
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| "0".to_string())
        });
        Self::start(responder, Duration::ZERO).await
    }

    /// Connection settings pointing at this fake.
    pub fn config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::for_host("127.0.0.1");
        config.port = self.port;
        config.read_timeout_ms = 2000;
        config.connect_timeout_ms = 2000;
        config
    }

    /// Command lines received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until at least `count` lines were received (do commands have no
    /// reply to synchronize on).
    pub async fn wait_for_lines(&self, count: usize) -> Vec<String> {
        for _ in 0..200 {
            let lines = self.received();
            if lines.len() >= count {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.received()
    }

    /// Number of queries that arrived while a reply was still owed.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Drop the listening task, closing the server side of the socket.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for FakeController {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
