//! Controller command vocabulary
//!
//! Static table of the 8742 base commands and the 8743 closed-loop
//! extensions. Each entry is a [`DoCommand`] or [`AskCommand`] constant;
//! [`all`] and [`lookup`] expose them by wire mnemonic for dynamic callers.
//!
//! Axis numbers are 1-2 on the 8743 and 1-4 on the 8742; they are not
//! checked locally.

#![allow(missing_docs)] // each entry carries its own summary string

use std::fmt;

use crate::error::DriverResult;
use crate::hardware::NewFocus8743;
use crate::protocol::codec::CommandValue;
use crate::protocol::command::{Arity, AskCommand, CommandDescriptor, DoCommand};

// --- 8742 base set ---------------------------------------------------------

pub const IDENTIFY: AskCommand<String> =
    AskCommand::text("*IDN?", Arity::None, "Identification string");
pub const RECALL: DoCommand =
    DoCommand::new("*RCL", Arity::Value, "Recall settings (0 = factory, 1 = saved)");
pub const RESET: DoCommand = DoCommand::new("*RST", Arity::None, "Soft reset");
pub const ABORT: DoCommand = DoCommand::new("AB", Arity::None, "Abort motion on all axes");
pub const SET_ACCELERATION: DoCommand =
    DoCommand::new("AC", Arity::AxisValue, "Set acceleration (steps/s^2)");
pub const GET_ACCELERATION: AskCommand<i64> =
    AskCommand::int("AC?", Arity::Axis, "Acceleration (steps/s^2)");
pub const DEFINE_HOME: DoCommand =
    DoCommand::new("DH", Arity::AxisValue, "Define home position");
pub const GET_HOME: AskCommand<i64> = AskCommand::int("DH?", Arity::Axis, "Home position");
pub const MOTOR_CHECK: DoCommand =
    DoCommand::new("MC", Arity::None, "Detect connected motors");
pub const MOTION_DONE: AskCommand<bool> =
    AskCommand::flag("MD?", Arity::Axis, "Motion done status");
pub const MOVE_INDEFINITELY: DoCommand =
    DoCommand::new("MV", Arity::AxisValue, "Move indefinitely (+ or -)");
pub const MOVE_ABSOLUTE: DoCommand =
    DoCommand::new("PA", Arity::AxisValue, "Move to absolute target");
pub const GET_ABSOLUTE_TARGET: AskCommand<i64> =
    AskCommand::int("PA?", Arity::Axis, "Absolute target position");
pub const MOVE_RELATIVE: DoCommand =
    DoCommand::new("PR", Arity::AxisValue, "Move relative");
pub const GET_RELATIVE_TARGET: AskCommand<i64> =
    AskCommand::int("PR?", Arity::Axis, "Relative target position");
pub const SET_MOTOR_TYPE: DoCommand =
    DoCommand::new("QM", Arity::AxisValue, "Set motor type");
pub const GET_MOTOR_TYPE: AskCommand<i64> =
    AskCommand::int("QM?", Arity::Axis, "Motor type");
pub const SET_CONTROLLER_ADDRESS: DoCommand =
    DoCommand::new("SA", Arity::Value, "Set controller address");
pub const GET_CONTROLLER_ADDRESS: AskCommand<i64> =
    AskCommand::int("SA?", Arity::None, "Controller address");
pub const SAVE_SETTINGS: DoCommand =
    DoCommand::new("SM", Arity::None, "Save settings to non-volatile memory");
pub const STOP: DoCommand = DoCommand::new("ST", Arity::Axis, "Stop motion (decelerate)");
pub const ERROR_MESSAGE: AskCommand<String> =
    AskCommand::text("TB?", Arity::None, "Error code and message");
pub const ERROR_CODE: AskCommand<i64> = AskCommand::int("TE?", Arity::None, "Error code");
pub const GET_POSITION: AskCommand<i64> =
    AskCommand::int("TP?", Arity::Axis, "Actual position");
pub const SET_VELOCITY: DoCommand =
    DoCommand::new("VA", Arity::AxisValue, "Set velocity (steps/s)");
pub const GET_VELOCITY: AskCommand<i64> =
    AskCommand::int("VA?", Arity::Axis, "Velocity (steps/s)");
pub const FIRMWARE_VERSION: AskCommand<String> =
    AskCommand::text("VE?", Arity::None, "Firmware version");
pub const PURGE_MEMORY: DoCommand =
    DoCommand::new("XX", Arity::None, "Purge user settings memory");

// --- 8743 closed-loop extensions -------------------------------------------

pub const SET_ABSOLUTE_POSITION_SEARCH_MODE: DoCommand = DoCommand::new(
    "AD",
    Arity::AxisValue,
    "Set absolute position search mode (0 stay, 1 return to start, 2 go to zero)",
);
pub const GET_ABSOLUTE_POSITION_SEARCH_MODE: AskCommand<i64> =
    AskCommand::int("AD?", Arity::Axis, "Absolute position search mode");
pub const SET_ABSOLUTE_ENCODER_PARAMETERS: DoCommand = DoCommand::new(
    "AE",
    Arity::AxisValue,
    "Set quasi-absolute encoder parameters (start increment, start position, increment, max marks)",
);
pub const GET_ABSOLUTE_ENCODER_PARAMETERS: AskCommand<Vec<i64>> =
    AskCommand::int_tuple("AE?", Arity::Axis, "Quasi-absolute encoder parameters");
pub const START_ABSOLUTE_POSITION_SEARCH: DoCommand =
    DoCommand::new("AF", Arity::Axis, "Start absolute position search");
pub const POSITION_SEARCH_DONE: AskCommand<bool> =
    AskCommand::flag("AF?", Arity::Axis, "Absolute position search completed");
pub const SET_UPDATE_INTERVAL: DoCommand =
    DoCommand::new("CL", Arity::AxisValue, "Set closed-loop update interval (s)");
pub const GET_UPDATE_INTERVAL: AskCommand<f64> =
    AskCommand::float("CL?", Arity::Axis, "Closed-loop update interval (s)");
pub const SET_DEADBAND: DoCommand =
    DoCommand::new("DB", Arity::AxisValue, "Set position deadband (counts)");
pub const GET_DEADBAND: AskCommand<i64> =
    AskCommand::int("DB?", Arity::Axis, "Position deadband (counts)");
pub const SET_FOLLOWING_ERROR_LIMIT: DoCommand =
    DoCommand::new("FE", Arity::AxisValue, "Set following error threshold (counts)");
pub const GET_FOLLOWING_ERROR_LIMIT: AskCommand<i64> =
    AskCommand::int("FE?", Arity::Axis, "Following error threshold (counts)");
pub const ENABLE_CLOSED_LOOP: DoCommand =
    DoCommand::new("MM", Arity::AxisValue, "Enable (1) or disable (0) closed-loop positioning");
pub const CLOSED_LOOP_STATUS: AskCommand<bool> =
    AskCommand::flag("MM?", Arity::Axis, "Closed-loop positioning enabled");
pub const FIND_TRAVEL_LIMIT: DoCommand =
    DoCommand::new("MT", Arity::AxisValue, "Find hardware travel limit (+ or -)");
pub const GET_MOVE_DIRECTION: AskCommand<String> =
    AskCommand::text("MV?", Arity::Axis, "Indefinite move direction");
pub const FIND_INDEX_POSITION: DoCommand =
    DoCommand::new("MZ", Arity::AxisValue, "Find nearest index (+ or -)");
pub const ABSOLUTE_POSITION_INITIALIZED: AskCommand<bool> = AskCommand::flag(
    "OF?",
    Arity::Axis,
    "Absolute position found since reset",
);
pub const FIND_HOME: DoCommand = DoCommand::new("OR", Arity::Axis, "Find home");
pub const GET_HARDWARE_STATUS: AskCommand<i64> =
    AskCommand::int("PH?", Arity::None, "Hardware status register");
pub const SET_AXIS_UNITS: DoCommand =
    DoCommand::new("SN", Arity::AxisValue, "Set displacement units (0 steps, 1 counts)");
pub const GET_AXIS_UNITS: AskCommand<i64> =
    AskCommand::int("SN?", Arity::Axis, "Displacement units (0 steps, 1 counts)");
pub const SET_POSITIVE_LIMIT: DoCommand =
    DoCommand::new("SR", Arity::AxisValue, "Set positive software travel limit");
pub const GET_POSITIVE_LIMIT: AskCommand<i64> =
    AskCommand::int("SR?", Arity::Axis, "Positive software travel limit");
pub const SET_NEGATIVE_LIMIT: DoCommand =
    DoCommand::new("SL", Arity::AxisValue, "Set negative software travel limit");
pub const GET_NEGATIVE_LIMIT: AskCommand<i64> =
    AskCommand::int("SL?", Arity::Axis, "Negative software travel limit");

/// A vocabulary entry with its reply type preserved.
#[derive(Debug, Clone, Copy)]
pub enum Entry {
    Do(&'static DoCommand),
    Text(&'static AskCommand<String>),
    Flag(&'static AskCommand<bool>),
    Int(&'static AskCommand<i64>),
    Float(&'static AskCommand<f64>),
    IntTuple(&'static AskCommand<Vec<i64>>),
}

/// Converted reply of a dynamically dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    /// Do commands produce no reply
    None,
    Text(String),
    Flag(bool),
    Int(i64),
    Float(f64),
    IntTuple(Vec<i64>),
}

impl fmt::Display for ReplyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyValue::None => Ok(()),
            ReplyValue::Text(v) => f.write_str(v),
            ReplyValue::Flag(v) => write!(f, "{}", v),
            ReplyValue::Int(v) => write!(f, "{}", v),
            ReplyValue::Float(v) => write!(f, "{}", v),
            ReplyValue::IntTuple(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

impl Entry {
    /// Type-erased descriptor.
    pub fn descriptor(&self) -> CommandDescriptor {
        match self {
            Entry::Do(c) => c.descriptor(),
            Entry::Text(c) => c.descriptor(),
            Entry::Flag(c) => c.descriptor(),
            Entry::Int(c) => c.descriptor(),
            Entry::Float(c) => c.descriptor(),
            Entry::IntTuple(c) => c.descriptor(),
        }
    }

    /// Run the entry on `driver`. Queries reject a `value` with
    /// `InvalidArguments`, the same as do commands declared without one.
    pub async fn run(
        &self,
        driver: &NewFocus8743,
        axis: Option<u8>,
        value: Option<CommandValue>,
    ) -> DriverResult<ReplyValue> {
        match self {
            Entry::Do(c) => driver.execute(c, axis, value).await.map(|()| ReplyValue::None),
            Entry::Text(c) => driver.query(c, axis, value.as_ref()).await.map(ReplyValue::Text),
            Entry::Flag(c) => driver.query(c, axis, value.as_ref()).await.map(ReplyValue::Flag),
            Entry::Int(c) => driver.query(c, axis, value.as_ref()).await.map(ReplyValue::Int),
            Entry::Float(c) => driver.query(c, axis, value.as_ref()).await.map(ReplyValue::Float),
            Entry::IntTuple(c) => driver.query(c, axis, value.as_ref()).await.map(ReplyValue::IntTuple),
        }
    }
}

static ENTRIES: &[Entry] = &[
    Entry::Text(&IDENTIFY),
    Entry::Do(&RECALL),
    Entry::Do(&RESET),
    Entry::Do(&ABORT),
    Entry::Do(&SET_ACCELERATION),
    Entry::Int(&GET_ACCELERATION),
    Entry::Do(&DEFINE_HOME),
    Entry::Int(&GET_HOME),
    Entry::Do(&MOTOR_CHECK),
    Entry::Flag(&MOTION_DONE),
    Entry::Do(&MOVE_INDEFINITELY),
    Entry::Do(&MOVE_ABSOLUTE),
    Entry::Int(&GET_ABSOLUTE_TARGET),
    Entry::Do(&MOVE_RELATIVE),
    Entry::Int(&GET_RELATIVE_TARGET),
    Entry::Do(&SET_MOTOR_TYPE),
    Entry::Int(&GET_MOTOR_TYPE),
    Entry::Do(&SET_CONTROLLER_ADDRESS),
    Entry::Int(&GET_CONTROLLER_ADDRESS),
    Entry::Do(&SAVE_SETTINGS),
    Entry::Do(&STOP),
    Entry::Text(&ERROR_MESSAGE),
    Entry::Int(&ERROR_CODE),
    Entry::Int(&GET_POSITION),
    Entry::Do(&SET_VELOCITY),
    Entry::Int(&GET_VELOCITY),
    Entry::Text(&FIRMWARE_VERSION),
    Entry::Do(&PURGE_MEMORY),
    Entry::Do(&SET_ABSOLUTE_POSITION_SEARCH_MODE),
    Entry::Int(&GET_ABSOLUTE_POSITION_SEARCH_MODE),
    Entry::Do(&SET_ABSOLUTE_ENCODER_PARAMETERS),
    Entry::IntTuple(&GET_ABSOLUTE_ENCODER_PARAMETERS),
    Entry::Do(&START_ABSOLUTE_POSITION_SEARCH),
    Entry::Flag(&POSITION_SEARCH_DONE),
    Entry::Do(&SET_UPDATE_INTERVAL),
    Entry::Float(&GET_UPDATE_INTERVAL),
    Entry::Do(&SET_DEADBAND),
    Entry::Int(&GET_DEADBAND),
    Entry::Do(&SET_FOLLOWING_ERROR_LIMIT),
    Entry::Int(&GET_FOLLOWING_ERROR_LIMIT),
    Entry::Do(&ENABLE_CLOSED_LOOP),
    Entry::Flag(&CLOSED_LOOP_STATUS),
    Entry::Do(&FIND_TRAVEL_LIMIT),
    Entry::Text(&GET_MOVE_DIRECTION),
    Entry::Do(&FIND_INDEX_POSITION),
    Entry::Flag(&ABSOLUTE_POSITION_INITIALIZED),
    Entry::Do(&FIND_HOME),
    Entry::Int(&GET_HARDWARE_STATUS),
    Entry::Do(&SET_AXIS_UNITS),
    Entry::Int(&GET_AXIS_UNITS),
    Entry::Do(&SET_POSITIVE_LIMIT),
    Entry::Int(&GET_POSITIVE_LIMIT),
    Entry::Do(&SET_NEGATIVE_LIMIT),
    Entry::Int(&GET_NEGATIVE_LIMIT),
];

/// Every command in the vocabulary.
pub fn all() -> &'static [Entry] {
    ENTRIES
}

/// Find a command by wire mnemonic (case-insensitive, e.g. `"mm?"`).
pub fn lookup(mnemonic: &str) -> Option<Entry> {
    ENTRIES
        .iter()
        .find(|entry| entry.descriptor().mnemonic.eq_ignore_ascii_case(mnemonic))
        .copied()
}
