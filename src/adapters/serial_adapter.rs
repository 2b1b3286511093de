//! Serial (RS-232 / USB virtual COM) connection to the controller
//!
//! Uses the same line framing as TCP. The connect preamble is a feature of the
//! controller's telnet server only, so no handshake bytes are drained here.

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

use super::StreamTransport;
use crate::error::{DriverError, DriverResult};

/// Open a serial port (8 data bits, no parity, 1 stop bit, no flow control).
///
/// # Arguments
/// * `port_path` - Serial port path (e.g., "/dev/ttyACM0" on Linux, "COM3" on Windows)
/// * `baud_rate` - Communication speed (the controller uses 115200 over USB)
pub fn open_serial(port_path: &str, baud_rate: u32) -> DriverResult<StreamTransport<SerialStream>> {
    let port = tokio_serial::new(port_path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| DriverError::Connection {
            target: port_path.to_string(),
            source: e.into(),
        })?;

    info!(endpoint = port_path, baud_rate, "Serial port opened");
    Ok(StreamTransport::new(port, port_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_port_is_connection_error() {
        let err = open_serial("/dev/nonexistent-newfocus", 115_200).err().unwrap();
        assert!(matches!(err, DriverError::Connection { .. }));
    }
}
