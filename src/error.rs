//! Custom error types for the driver.
//!
//! `DriverError` is the single error type returned by every transport, codec
//! and driver operation. It separates the failures that break the byte stream
//! (connection loss, framing faults, timeouts) from the ones that are local to
//! a single exchange (reply conversion, argument/arity mismatch, controller
//! error replies).
//!
//! ## Error Hierarchy
//!
//! - **`Connection`**: the stream could not be opened, or the peer closed it.
//! - **`Framing`**: a reply did not end with the expected `CR LF` terminator,
//!   or the stream ended mid-line. The stream is desynchronized.
//! - **`Timeout`**: no reply terminator arrived within the read timeout. Which
//!   reply belongs to which query can no longer be known.
//! - **`Closed`**: the driver was closed (explicitly or after a fatal error).
//! - **`Conversion`**: a reply arrived intact but the declared converter could
//!   not parse it. The connection stays usable.
//! - **`Controller`**: an error reported by the controller itself (`TB?`).
//! - **`InvalidArguments`**: the call did not match the command's declared arity.
//!
//! Fatal variants (see [`DriverError::is_fatal`]) force the connection into the
//! closed state; a fresh `connect` is required afterwards.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias for results using the driver error type.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Error returned by every transport, codec and driver operation.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The stream could not be opened, or the peer closed it.
    #[error("Connection error ({target}): {source}")]
    Connection {
        /// Endpoint the connection was made to
        target: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A reply was not terminated as expected; the stream is desynchronized.
    #[error("Framing error: {0}")]
    Framing(String),

    /// A reply arrived intact but could not be converted.
    #[error("Cannot convert reply {payload:?} to {expected}")]
    Conversion {
        /// Reply payload without terminator
        payload: String,
        /// Name of the expected type
        expected: &'static str,
    },

    /// Error queued by the controller and read back with `TB?`.
    #[error("Controller error {code}: {message}")]
    Controller {
        /// Raw code (axis * 100 + error for axis-specific errors)
        code: i32,
        /// Controller message text
        message: String,
    },

    /// The driver was closed explicitly or after a fatal error.
    #[error("Connection is closed")]
    Closed,

    /// No reply arrived within the read timeout.
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// Arguments do not match the command's declared arity.
    #[error("Invalid arguments for {mnemonic}: {reason}")]
    InvalidArguments {
        /// Wire mnemonic of the rejected command
        mnemonic: &'static str,
        /// What was wrong
        reason: &'static str,
    },

    /// I/O failure on an open stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DriverError {
    /// Whether this error leaves the byte stream unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Connection { .. }
                | DriverError::Framing(_)
                | DriverError::Timeout(_)
                | DriverError::Closed
                | DriverError::Io(_)
        )
    }

    pub(crate) fn conversion(payload: &str, expected: &'static str) -> Self {
        DriverError::Conversion {
            payload: payload.to_string(),
            expected,
        }
    }
}
