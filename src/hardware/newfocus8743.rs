//! New Focus / Newport 8742 and 8743-CL Picomotor Controller Driver
//!
//! Protocol Overview:
//! - Format: [Axis][Mnemonic][Value] (ASCII, no separators)
//! - Commands end with CR, replies end with CR LF
//! - Timing: strictly half-duplex; one reply per query, in order
//! - TCP: port 23, 6 preamble bytes are sent on connect and must be drained
//!
//! # Example Usage
//!
//! ```no_run
//! use newfocus8743::hardware::NewFocus8743;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let driver = NewFocus8743::connect("192.168.1.101", 23).await?;
//!
//!     println!("{}", driver.identify().await?);
//!     driver.enable_closed_loop(1, true).await?;
//!     assert!(driver.closed_loop_status(1).await?);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::adapters::{connect_tcp, Transport};
use crate::config::ConnectionConfig;
use crate::error::{DriverError, DriverResult};
use crate::protocol::codec::CommandValue;
use crate::protocol::command::{AskCommand, DoCommand};
use crate::protocol::controller_error::{parse_error_reply, ControllerError};
use crate::protocol::vocabulary as cmd;

/// Open connection state.
struct Connection {
    transport: Box<dyn Transport>,
    /// Set before a command is written and cleared once it completed (after
    /// the write for do commands, after the reply for queries). If it is
    /// still set when the next exchange starts, the previous caller was
    /// cancelled: a partial line or an unread reply may be on the wire.
    in_flight: bool,
}

/// Driver for one New Focus 8742/8743 controller.
///
/// All commands share a single connection protected by a mutex that is held
/// for the complete write/read exchange, so concurrent callers are serialized
/// and every reply is paired with the query that caused it.
pub struct NewFocus8743 {
    /// `None` once closed
    connection: Mutex<Option<Connection>>,
    /// Reply timeout (None = wait forever)
    read_timeout: Option<Duration>,
    span: Span,
}

impl NewFocus8743 {
    /// Connect over TCP with default settings.
    pub async fn connect(host: &str, port: u16) -> DriverResult<Self> {
        let mut config = ConnectionConfig::for_host(host);
        config.port = port;
        Self::connect_with(&config).await
    }

    /// Connect over TCP using explicit connection settings.
    pub async fn connect_with(config: &ConnectionConfig) -> DriverResult<Self> {
        let transport = connect_tcp(config).await?;
        Ok(Self::from_transport(transport, config.read_timeout()))
    }

    /// Open a serial connection.
    #[cfg(feature = "instrument_serial")]
    pub fn open_serial(
        port_path: &str,
        baud_rate: u32,
        read_timeout: Option<Duration>,
    ) -> DriverResult<Self> {
        let transport = crate::adapters::open_serial(port_path, baud_rate)?;
        Ok(Self::from_transport(transport, read_timeout))
    }

    /// Wrap an already-open (and, if needed, already handshaken) transport.
    pub fn from_transport<T>(transport: T, read_timeout: Option<Duration>) -> Self
    where
        T: Transport + 'static,
    {
        let span = info_span!("newfocus8743", endpoint = %transport.describe());
        Self {
            connection: Mutex::new(Some(Connection {
                transport: Box::new(transport),
                in_flight: false,
            })),
            read_timeout,
            span,
        }
    }

    /// Whether the connection is still open.
    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Close the connection. Closing an already-closed driver is not an error.
    pub async fn close(&self) -> DriverResult<()> {
        let taken = self.connection.lock().await.take();
        if let Some(mut conn) = taken {
            conn.transport.close().instrument(self.span.clone()).await?;
            info!(parent: &self.span, "Connection closed");
        }
        Ok(())
    }

    /// Run a do command: write one line, read nothing.
    pub async fn execute(
        &self,
        command: &DoCommand,
        axis: Option<u8>,
        value: Option<CommandValue>,
    ) -> DriverResult<()> {
        let line = command.encode(axis, value.as_ref());
        self.transaction(line, false).await.map(|_| ())
    }

    /// Run an ask command: write one line, read exactly one reply, convert it.
    pub async fn ask<T>(&self, command: &AskCommand<T>, axis: Option<u8>) -> DriverResult<T> {
        self.query(command, axis, None).await
    }

    /// Like [`Self::ask`], for dynamic callers that may pass a value. Queries
    /// take none, so any value is rejected with `InvalidArguments`.
    pub(crate) async fn query<T>(
        &self,
        command: &AskCommand<T>,
        axis: Option<u8>,
        value: Option<&CommandValue>,
    ) -> DriverResult<T> {
        let line = command.encode_with(axis, value);
        let reply = self.transaction(line, true).await?;
        command.decode(&reply)
    }

    /// Send one line and, for queries, read its reply while holding the lock.
    ///
    /// A closed driver reports `Closed` before the encoded line is looked at.
    /// Fatal errors close the connection before they are returned.
    async fn transaction(
        &self,
        line: DriverResult<String>,
        expect_reply: bool,
    ) -> DriverResult<String> {
        async {
            let mut guard = self.connection.lock().await;
            let conn = guard.as_mut().ok_or(DriverError::Closed)?;
            let line = line?;

            let result = if conn.in_flight {
                Err(DriverError::Framing(
                    "a previous command was abandoned before it completed".to_string(),
                ))
            } else {
                Self::exchange(conn, &line, expect_reply, self.read_timeout).await
            };

            if let Err(err) = &result {
                if err.is_fatal() {
                    warn!(command = %line, error = %err, "Closing desynchronized connection");
                    if let Some(mut conn) = guard.take() {
                        let _ = conn.transport.close().await;
                    }
                }
            }
            result
        }
        .instrument(self.span.clone())
        .await
    }

    async fn exchange(
        conn: &mut Connection,
        line: &str,
        expect_reply: bool,
        read_timeout: Option<Duration>,
    ) -> DriverResult<String> {
        // Marked before the write: a cancelled write may leave a partial
        // line that the next command would be appended to.
        conn.in_flight = true;
        conn.transport.write_line(line).await?;

        if !expect_reply {
            conn.in_flight = false;
            debug!(command = line, "Sent");
            return Ok(String::new());
        }

        let reply = match read_timeout {
            Some(limit) => tokio::time::timeout(limit, conn.transport.read_line())
                .await
                .map_err(|_| DriverError::Timeout(limit))??,
            None => conn.transport.read_line().await?,
        };
        conn.in_flight = false;

        debug!(command = line, reply = %reply, "Received");
        Ok(reply)
    }

    // ------------------------------------------------------------------
    // Controller error queue
    // ------------------------------------------------------------------

    /// Read (and clear) the oldest pending controller error.
    pub async fn last_error(&self) -> DriverResult<Option<ControllerError>> {
        let reply = self.ask(&cmd::ERROR_MESSAGE, None).await?;
        parse_error_reply(&reply)
    }

    /// Fail with [`DriverError::Controller`] if the controller has an error queued.
    pub async fn check(&self) -> DriverResult<()> {
        match self.last_error().await? {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // General (8742 base set)
    // ------------------------------------------------------------------

    /// Identification string (manufacturer, model, firmware, date, serial).
    pub async fn identify(&self) -> DriverResult<String> {
        self.ask(&cmd::IDENTIFY, None).await
    }

    /// Firmware version string.
    pub async fn firmware_version(&self) -> DriverResult<String> {
        self.ask(&cmd::FIRMWARE_VERSION, None).await
    }

    /// Soft reset.
    pub async fn reset(&self) -> DriverResult<()> {
        self.execute(&cmd::RESET, None, None).await
    }

    /// Recall settings (0 = factory defaults, 1 = last saved).
    pub async fn recall_settings(&self, bank: u8) -> DriverResult<()> {
        self.execute(&cmd::RECALL, None, Some(bank.into())).await
    }

    /// Save settings to non-volatile memory.
    pub async fn save_settings(&self) -> DriverResult<()> {
        self.execute(&cmd::SAVE_SETTINGS, None, None).await
    }

    /// Purge saved user settings.
    pub async fn purge_memory(&self) -> DriverResult<()> {
        self.execute(&cmd::PURGE_MEMORY, None, None).await
    }

    /// Detect connected motors.
    pub async fn motor_check(&self) -> DriverResult<()> {
        self.execute(&cmd::MOTOR_CHECK, None, None).await
    }

    /// Set the controller address used on a multi-controller bus.
    pub async fn set_controller_address(&self, address: u8) -> DriverResult<()> {
        self.execute(&cmd::SET_CONTROLLER_ADDRESS, None, Some(address.into()))
            .await
    }

    /// Controller address.
    pub async fn get_controller_address(&self) -> DriverResult<i64> {
        self.ask(&cmd::GET_CONTROLLER_ADDRESS, None).await
    }

    /// Numeric code of the oldest pending error (0 = none).
    pub async fn error_code(&self) -> DriverResult<i64> {
        self.ask(&cmd::ERROR_CODE, None).await
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Abort motion on all axes without deceleration.
    pub async fn abort(&self) -> DriverResult<()> {
        self.execute(&cmd::ABORT, None, None).await
    }

    /// Stop motion on `axis` using the programmed deceleration.
    pub async fn stop(&self, axis: u8) -> DriverResult<()> {
        self.execute(&cmd::STOP, Some(axis), None).await
    }

    /// Move `axis` to an absolute target position.
    pub async fn move_absolute(&self, axis: u8, position: i64) -> DriverResult<()> {
        self.execute(&cmd::MOVE_ABSOLUTE, Some(axis), Some(position.into()))
            .await
    }

    /// Target position of the last absolute move.
    pub async fn get_absolute_target(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_ABSOLUTE_TARGET, Some(axis)).await
    }

    /// Move `axis` by `steps` relative to its current position.
    pub async fn move_relative(&self, axis: u8, steps: i64) -> DriverResult<()> {
        self.execute(&cmd::MOVE_RELATIVE, Some(axis), Some(steps.into()))
            .await
    }

    /// Target of the last relative move.
    pub async fn get_relative_target(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_RELATIVE_TARGET, Some(axis)).await
    }

    /// Move until stopped; `direction` is `'+'` or `'-'`.
    pub async fn move_indefinitely(&self, axis: u8, direction: char) -> DriverResult<()> {
        self.execute(&cmd::MOVE_INDEFINITELY, Some(axis), Some(direction.into()))
            .await
    }

    /// Direction of the current indefinite move (`+` or `-`).
    pub async fn get_move_direction(&self, axis: u8) -> DriverResult<String> {
        self.ask(&cmd::GET_MOVE_DIRECTION, Some(axis)).await
    }

    /// Whether motion on `axis` has finished.
    pub async fn motion_done(&self, axis: u8) -> DriverResult<bool> {
        self.ask(&cmd::MOTION_DONE, Some(axis)).await
    }

    /// Actual position (steps or encoder counts, see [`Self::get_axis_units`]).
    pub async fn get_position(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_POSITION, Some(axis)).await
    }

    /// Define the current position of `axis` as `position`.
    pub async fn define_home(&self, axis: u8, position: i64) -> DriverResult<()> {
        self.execute(&cmd::DEFINE_HOME, Some(axis), Some(position.into()))
            .await
    }

    /// Home position.
    pub async fn get_home(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_HOME, Some(axis)).await
    }

    /// Set the velocity of `axis` in steps per second.
    pub async fn set_velocity(&self, axis: u8, steps_per_sec: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_VELOCITY, Some(axis), Some(steps_per_sec.into()))
            .await
    }

    /// Velocity in steps per second.
    pub async fn get_velocity(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_VELOCITY, Some(axis)).await
    }

    /// Set the acceleration of `axis` in steps per second squared.
    pub async fn set_acceleration(&self, axis: u8, steps_per_sec2: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_ACCELERATION, Some(axis), Some(steps_per_sec2.into()))
            .await
    }

    /// Acceleration in steps per second squared.
    pub async fn get_acceleration(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_ACCELERATION, Some(axis)).await
    }

    /// Set the motor type (0 none, 1 unknown, 2 tiny, 3 standard).
    pub async fn set_motor_type(&self, axis: u8, motor_type: u8) -> DriverResult<()> {
        self.execute(&cmd::SET_MOTOR_TYPE, Some(axis), Some(motor_type.into()))
            .await
    }

    /// Motor type.
    pub async fn get_motor_type(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_MOTOR_TYPE, Some(axis)).await
    }

    // ------------------------------------------------------------------
    // Closed loop (8743)
    // ------------------------------------------------------------------

    /// Final move after an absolute position search (0 stay, 1 start, 2 zero).
    pub async fn set_absolute_position_search_mode(&self, axis: u8, mode: u8) -> DriverResult<()> {
        self.execute(
            &cmd::SET_ABSOLUTE_POSITION_SEARCH_MODE,
            Some(axis),
            Some(mode.into()),
        )
        .await
    }

    /// Final move after an absolute position search.
    pub async fn get_absolute_position_search_mode(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_ABSOLUTE_POSITION_SEARCH_MODE, Some(axis))
            .await
    }

    /// Quasi-absolute encoder parameters: start index increment, start
    /// absolute position, index increment, maximum number of index marks.
    pub async fn set_absolute_encoder_parameters(
        &self,
        axis: u8,
        parameters: [i64; 4],
    ) -> DriverResult<()> {
        self.execute(
            &cmd::SET_ABSOLUTE_ENCODER_PARAMETERS,
            Some(axis),
            Some(parameters.to_vec().into()),
        )
        .await
    }

    /// Quasi-absolute encoder parameters, in the order they are set.
    pub async fn get_absolute_encoder_parameters(&self, axis: u8) -> DriverResult<Vec<i64>> {
        self.ask(&cmd::GET_ABSOLUTE_ENCODER_PARAMETERS, Some(axis))
            .await
    }

    /// Start the absolute position search on `axis`.
    pub async fn start_absolute_position_search(&self, axis: u8) -> DriverResult<()> {
        self.execute(&cmd::START_ABSOLUTE_POSITION_SEARCH, Some(axis), None)
            .await
    }

    /// Whether the absolute position search on `axis` has completed.
    pub async fn position_search_done(&self, axis: u8) -> DriverResult<bool> {
        self.ask(&cmd::POSITION_SEARCH_DONE, Some(axis)).await
    }

    /// Whether the absolute position was found since the last reset.
    pub async fn absolute_position_initialized(&self, axis: u8) -> DriverResult<bool> {
        self.ask(&cmd::ABSOLUTE_POSITION_INITIALIZED, Some(axis))
            .await
    }

    /// Closed-loop correction interval in seconds.
    pub async fn set_update_interval(&self, axis: u8, seconds: f64) -> DriverResult<()> {
        self.execute(&cmd::SET_UPDATE_INTERVAL, Some(axis), Some(seconds.into()))
            .await
    }

    /// Closed-loop correction interval in seconds.
    pub async fn get_update_interval(&self, axis: u8) -> DriverResult<f64> {
        self.ask(&cmd::GET_UPDATE_INTERVAL, Some(axis)).await
    }

    /// Set the closed-loop deadband in encoder counts.
    pub async fn set_deadband(&self, axis: u8, counts: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_DEADBAND, Some(axis), Some(counts.into()))
            .await
    }

    /// Closed-loop deadband in encoder counts.
    pub async fn get_deadband(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_DEADBAND, Some(axis)).await
    }

    /// Set the following error threshold in encoder counts.
    pub async fn set_following_error_limit(&self, axis: u8, counts: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_FOLLOWING_ERROR_LIMIT, Some(axis), Some(counts.into()))
            .await
    }

    /// Following error threshold in encoder counts.
    pub async fn get_following_error_limit(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_FOLLOWING_ERROR_LIMIT, Some(axis)).await
    }

    /// Enable or disable closed-loop positioning on `axis`.
    pub async fn enable_closed_loop(&self, axis: u8, enable: bool) -> DriverResult<()> {
        self.execute(&cmd::ENABLE_CLOSED_LOOP, Some(axis), Some(enable.into()))
            .await
    }

    /// Whether closed-loop positioning is enabled on `axis`.
    pub async fn closed_loop_status(&self, axis: u8) -> DriverResult<bool> {
        self.ask(&cmd::CLOSED_LOOP_STATUS, Some(axis)).await
    }

    /// Move to the hardware travel limit in `direction` (`'+'` or `'-'`).
    pub async fn find_travel_limit(&self, axis: u8, direction: char) -> DriverResult<()> {
        self.execute(&cmd::FIND_TRAVEL_LIMIT, Some(axis), Some(direction.into()))
            .await
    }

    /// Move to the nearest index in `direction` (`'+'` or `'-'`).
    pub async fn find_index_position(&self, axis: u8, direction: char) -> DriverResult<()> {
        self.execute(&cmd::FIND_INDEX_POSITION, Some(axis), Some(direction.into()))
            .await
    }

    /// Move to the home position.
    pub async fn find_home(&self, axis: u8) -> DriverResult<()> {
        self.execute(&cmd::FIND_HOME, Some(axis), None).await
    }

    /// Hardware status register (digital inputs of all axes).
    pub async fn get_hardware_status(&self) -> DriverResult<i64> {
        self.ask(&cmd::GET_HARDWARE_STATUS, None).await
    }

    /// Displacement units: 0 = steps (open loop), 1 = encoder counts.
    pub async fn set_axis_units(&self, axis: u8, units: u8) -> DriverResult<()> {
        self.execute(&cmd::SET_AXIS_UNITS, Some(axis), Some(units.into()))
            .await
    }

    /// Displacement units (0 steps, 1 encoder counts).
    pub async fn get_axis_units(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_AXIS_UNITS, Some(axis)).await
    }

    /// Set the positive software travel limit.
    pub async fn set_positive_limit(&self, axis: u8, counts: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_POSITIVE_LIMIT, Some(axis), Some(counts.into()))
            .await
    }

    /// Positive software travel limit.
    pub async fn get_positive_limit(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_POSITIVE_LIMIT, Some(axis)).await
    }

    /// Set the negative software travel limit.
    pub async fn set_negative_limit(&self, axis: u8, counts: i64) -> DriverResult<()> {
        self.execute(&cmd::SET_NEGATIVE_LIMIT, Some(axis), Some(counts.into()))
            .await
    }

    /// Negative software travel limit.
    pub async fn get_negative_limit(&self, axis: u8) -> DriverResult<i64> {
        self.ask(&cmd::GET_NEGATIVE_LIMIT, Some(axis)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StreamTransport;
    use tokio_test::io::Builder;

    fn driver(mock: tokio_test::io::Mock) -> NewFocus8743 {
        NewFocus8743::from_transport(StreamTransport::new(mock, "mock"), None)
    }

    #[tokio::test]
    async fn test_do_writes_exact_bytes_and_reads_nothing() {
        let mock = Builder::new().write(b"1MM0\r").build();
        let driver = driver(mock);
        driver.enable_closed_loop(1, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_ask_bool_reply() {
        let mock = Builder::new().write(b"1MM?\r").read(b"1\r\n").build();
        let driver = driver(mock);
        assert!(driver.closed_loop_status(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_ask_int_tuple_reply() {
        let mock = Builder::new()
            .write(b"2AE?\r")
            .read(b"570,8190,10,25\r\n")
            .build();
        let driver = driver(mock);
        assert_eq!(
            driver.get_absolute_encoder_parameters(2).await.unwrap(),
            vec![570, 8190, 10, 25]
        );
    }

    #[tokio::test]
    async fn test_conversion_error_keeps_connection_open() {
        let mock = Builder::new()
            .write(b"1DB?\r")
            .read(b"PARAMETER OUT OF RANGE\r\n")
            .write(b"1DB?\r")
            .read(b"5\r\n")
            .build();
        let driver = driver(mock);

        let err = driver.get_deadband(1).await.unwrap_err();
        assert!(matches!(err, DriverError::Conversion { .. }));
        assert!(driver.is_open().await);
        assert_eq!(driver.get_deadband(1).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_framing_error_closes_connection() {
        let mock = Builder::new().write(b"1TP?\r").read(b"12\n").build();
        let driver = driver(mock);

        let err = driver.get_position(1).await.unwrap_err();
        assert!(matches!(err, DriverError::Framing(_)));
        assert!(!driver.is_open().await);
        assert!(matches!(
            driver.get_position(1).await,
            Err(DriverError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_arity_error_writes_nothing() {
        let mock = Builder::new().build();
        let driver = driver(mock);
        let err = driver
            .execute(&cmd::START_ABSOLUTE_POSITION_SEARCH, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidArguments { .. }));
        assert!(driver.is_open().await);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let driver = driver(Builder::new().build());
        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(!driver.is_open().await);
        assert!(matches!(driver.abort().await, Err(DriverError::Closed)));
    }

    #[tokio::test]
    async fn test_last_error_and_check() {
        let mock = Builder::new()
            .write(b"TB?\r")
            .read(b"0, NO ERROR DETECTED\r\n")
            .write(b"TB?\r")
            .read(b"207, MOTION IN PROGRESS\r\n")
            .build();
        let driver = driver(mock);

        assert_eq!(driver.last_error().await.unwrap(), None);
        let err = driver.check().await.unwrap_err();
        assert!(matches!(err, DriverError::Controller { code: 207, .. }));
    }

    #[tokio::test]
    async fn test_closed_takes_precedence_over_arity() {
        let driver = driver(Builder::new().build());
        driver.close().await.unwrap();

        let err = driver
            .execute(&cmd::START_ABSOLUTE_POSITION_SEARCH, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Closed));
        assert!(matches!(
            driver.ask(&cmd::GET_POSITION, None).await,
            Err(DriverError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_query_rejects_next_call() {
        let mock = Builder::new()
            .write(b"1TP?\r")
            .wait(Duration::from_secs(10))
            .build();
        let driver = driver(mock);

        let first = tokio::time::timeout(Duration::from_millis(50), driver.get_position(1)).await;
        assert!(first.is_err());
        assert!(driver.is_open().await);

        let err = driver.get_position(1).await.unwrap_err();
        assert!(matches!(err, DriverError::Framing(_)));
        assert!(!driver.is_open().await);
        assert!(matches!(
            driver.get_position(1).await,
            Err(DriverError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_do_write_rejects_next_command() {
        use tokio::io::AsyncReadExt;

        // Four bytes of buffer: "1MM0\r" cannot be written in full until
        // the peer reads, which it never does before the timeout.
        let (client, mut controller) = tokio::io::duplex(4);
        let driver = NewFocus8743::from_transport(StreamTransport::new(client, "duplex"), None);

        let first =
            tokio::time::timeout(Duration::from_millis(50), driver.enable_closed_loop(1, false))
                .await;
        assert!(first.is_err());

        let err = driver.stop(2).await.unwrap_err();
        assert!(matches!(err, DriverError::Framing(_)));
        assert!(!driver.is_open().await);

        let mut received = Vec::new();
        controller.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"1MM0");
    }

    #[tokio::test]
    async fn test_completed_do_does_not_block_next_command() {
        let mock = Builder::new().write(b"1ST\r").write(b"2ST\r").build();
        let driver = driver(mock);
        driver.stop(1).await.unwrap();
        driver.stop(2).await.unwrap();
        assert!(driver.is_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout_closes_connection() {
        let mock = Builder::new()
            .write(b"1MD?\r")
            .wait(Duration::from_secs(10))
            .build();
        let driver = NewFocus8743::from_transport(
            StreamTransport::new(mock, "mock"),
            Some(Duration::from_millis(200)),
        );

        let err = driver.motion_done(1).await.unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)));
        assert!(!driver.is_open().await);
    }
}
