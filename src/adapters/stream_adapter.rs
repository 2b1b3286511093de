//! Line framing over an async duplex stream
//!
//! [`StreamTransport`] wraps anything that is `AsyncRead + AsyncWrite`
//! (a `TcpStream`, a `SerialStream`, an in-memory mock) and implements the
//! controller's framing on top of it.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::{Transport, MAX_LINE_LEN, READ_TERMINATOR, WRITE_TERMINATOR};
use crate::error::{DriverError, DriverResult};

/// Framed transport over an async byte stream.
pub struct StreamTransport<S> {
    /// Buffered stream; `BufReader` passes writes straight through
    stream: BufReader<S>,
    /// Endpoint description for logs and errors
    target: String,
    closed: bool,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-open stream.
    pub fn new(stream: S, target: impl Into<String>) -> Self {
        Self {
            stream: BufReader::new(stream),
            target: target.into(),
            closed: false,
        }
    }

    /// Read and discard exactly `len` raw bytes.
    ///
    /// The TCP controller emits a short preamble right after accept; if it is
    /// not drained, the first reply read picks it up and every later reply is
    /// shifted by one.
    pub async fn handshake(&mut self, len: usize) -> DriverResult<Vec<u8>> {
        let mut preamble = vec![0u8; len];
        self.stream
            .read_exact(&mut preamble)
            .await
            .map_err(|source| DriverError::Connection {
                target: self.target.clone(),
                source,
            })?;
        debug!(endpoint = %self.target, preamble = ?preamble, "Drained connect preamble");
        Ok(preamble)
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn describe(&self) -> &str {
        &self.target
    }

    async fn write_line(&mut self, payload: &str) -> DriverResult<()> {
        self.ensure_open()?;

        let mut frame = Vec::with_capacity(payload.len() + WRITE_TERMINATOR.len());
        frame.extend_from_slice(payload.as_bytes());
        frame.extend_from_slice(WRITE_TERMINATOR);

        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> DriverResult<String> {
        self.ensure_open()?;

        let mut line = Vec::with_capacity(64);
        let n = (&mut self.stream)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut line)
            .await?;

        if n == 0 {
            return Err(DriverError::Connection {
                target: self.target.clone(),
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "controller closed the connection",
                ),
            });
        }

        if n == MAX_LINE_LEN && !line.ends_with(b"\n") {
            warn!(endpoint = %self.target, limit = MAX_LINE_LEN, "Reply line too long");
            return Err(DriverError::Framing(format!(
                "reply from {} exceeds {} bytes without a terminator",
                self.target, MAX_LINE_LEN
            )));
        }

        if !line.ends_with(READ_TERMINATOR) {
            let received = String::from_utf8_lossy(&line).into_owned();
            warn!(endpoint = %self.target, received = ?received, "Reply not terminated by CR LF");
            return Err(DriverError::Framing(format!(
                "reply {:?} from {} is not terminated by CR LF",
                received, self.target
            )));
        }

        line.truncate(line.len() - READ_TERMINATOR.len());
        String::from_utf8(line).map_err(|e| {
            DriverError::Framing(format!("reply from {} is not ASCII: {}", self.target, e))
        })
    }

    async fn close(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // The peer may already be gone; the stream is released either way.
        if let Err(e) = self.stream.shutdown().await {
            debug!(endpoint = %self.target, error = %e, "Shutdown on close failed");
        }
        Ok(())
    }
}
