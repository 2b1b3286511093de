//! Controller-reported errors
//!
//! The controller never answers a faulty command directly; it queues an error
//! that is read back with `TB?` (`"<code>, <MESSAGE>"`). Axis-specific errors
//! carry the axis number in the hundreds digit, e.g. `108` is error 8 on
//! axis 1.

use crate::error::{DriverError, DriverResult};

/// Code reported when no error is pending.
pub const NO_ERROR: i32 = 0;

/// One decoded `TB?` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerError {
    /// Raw error code (axis * 100 + error for axis-specific errors)
    pub code: i32,
    /// Controller message, e.g. `"MOTION IN PROGRESS"`
    pub message: String,
}

impl ControllerError {
    /// Axis the error refers to, if it is axis-specific.
    pub fn axis(&self) -> Option<u8> {
        u8::try_from(self.code / 100).ok().filter(|axis| *axis > 0)
    }

    /// Error number without the axis component.
    pub fn base_code(&self) -> i32 {
        self.code % 100
    }
}

impl From<ControllerError> for DriverError {
    fn from(err: ControllerError) -> Self {
        DriverError::Controller {
            code: err.code,
            message: err.message,
        }
    }
}

/// Parse a `TB?` reply. Returns `None` when the controller reports no error.
pub fn parse_error_reply(raw: &str) -> DriverResult<Option<ControllerError>> {
    let (code, message) = raw
        .split_once(',')
        .ok_or_else(|| DriverError::conversion(raw, "error code and message"))?;
    let code: i32 = code
        .trim()
        .parse()
        .map_err(|_| DriverError::conversion(raw, "error code and message"))?;

    if code == NO_ERROR {
        return Ok(None);
    }
    Ok(Some(ControllerError {
        code,
        message: message.trim().to_string(),
    }))
}
