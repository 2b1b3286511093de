//! Transport adapters
//!
//! This module defines the [`Transport`] trait, the line-framed byte channel
//! the driver talks through, and its implementations:
//!
//! - [`StreamTransport`]: framing over any async duplex stream
//! - [`tcp_adapter::connect_tcp`]: TCP/telnet connection with the connect preamble drained
//! - `serial_adapter::open_serial`: RS-232/USB serial (feature `instrument_serial`)
//!
//! Wire framing is asymmetric: commands end with a single `CR`, replies end
//! with `CR LF`.

pub mod stream_adapter;
pub mod tcp_adapter;

#[cfg(feature = "instrument_serial")]
pub mod serial_adapter;

pub use stream_adapter::StreamTransport;
pub use tcp_adapter::connect_tcp;

#[cfg(feature = "instrument_serial")]
pub use serial_adapter::open_serial;

use async_trait::async_trait;

use crate::error::DriverResult;

/// Terminator appended to every command line.
pub const WRITE_TERMINATOR: &[u8] = b"\r";

/// Terminator expected at the end of every reply line.
pub const READ_TERMINATOR: &[u8] = b"\r\n";

/// Longest reply line accepted, terminator included. Controller replies are
/// a few dozen bytes; anything longer is a desynchronized stream.
pub const MAX_LINE_LEN: usize = 4096;

/// Line-framed, half-duplex byte channel to one controller.
///
/// Implementations perform no locking of their own: the driver holds the
/// transport behind a mutex for the whole write/read exchange.
#[async_trait]
pub trait Transport: Send {
    /// Human-readable endpoint (`host:port`, serial path, ...).
    fn describe(&self) -> &str;

    /// Write `payload` followed by [`WRITE_TERMINATOR`] as one transmission.
    async fn write_line(&mut self, payload: &str) -> DriverResult<()>;

    /// Read one reply line and return it without [`READ_TERMINATOR`].
    async fn read_line(&mut self) -> DriverResult<String>;

    /// Release the stream. Calling it more than once is not an error.
    async fn close(&mut self) -> DriverResult<()>;
}
