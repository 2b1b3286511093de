//! Command factory
//!
//! Every controller command is one of two shapes:
//!
//! - [`DoCommand`]: write one line, expect no reply.
//! - [`AskCommand`]: write one line, read exactly one reply line, convert it.
//!
//! Both are `const`-constructible descriptors binding a wire mnemonic, an
//! [`Arity`] and (for asks) a reply converter. They carry no per-command
//! logic; the driver executes them through two generic entry points.

use crate::error::{DriverError, DriverResult};
use crate::protocol::codec::{self, CommandValue};
use crate::protocol::convert::{
    conv_bool, conv_float, conv_int, conv_int_tuple, identity, Converter,
};

/// Which optional parts a command line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// `MN`
    None,
    /// `xxMN`
    Axis,
    /// `xxMNnn`
    AxisValue,
    /// `MNnn`
    Value,
}

impl Arity {
    /// Whether an axis prefix is rendered.
    pub const fn takes_axis(self) -> bool {
        matches!(self, Arity::Axis | Arity::AxisValue)
    }

    /// Whether a value suffix is rendered.
    pub const fn takes_value(self) -> bool {
        matches!(self, Arity::AxisValue | Arity::Value)
    }
}

/// Operation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fire-and-forget write
    Do,
    /// Write then read one reply
    Ask,
}

/// Reply conversion tag, for the type-erased descriptor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// No reply
    None,
    /// String passthrough
    Identity,
    /// `"0"` = false, other numbers = true
    Bool,
    /// Decimal integer
    Int,
    /// Decimal number
    Float,
    /// Comma-separated integers
    IntTuple,
}

/// Type-erased view of a command, used by the vocabulary table and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Wire mnemonic (ask mnemonics include the trailing `?`)
    pub mnemonic: &'static str,
    /// Operation shape
    pub shape: Shape,
    /// Argument layout
    pub arity: Arity,
    /// Reply conversion
    pub conversion: Conversion,
    /// One-line description
    pub summary: &'static str,
}

fn check_arity(
    mnemonic: &'static str,
    arity: Arity,
    axis: Option<u8>,
    value: Option<&CommandValue>,
) -> DriverResult<()> {
    let invalid = |reason| Err(DriverError::InvalidArguments { mnemonic, reason });

    match (arity.takes_axis(), axis.is_some()) {
        (true, false) => return invalid("axis is required"),
        (false, true) => return invalid("command takes no axis"),
        _ => {}
    }
    match (arity.takes_value(), value) {
        (true, None) => invalid("value is required"),
        (false, Some(_)) => invalid("command takes no value"),
        (true, Some(v)) if !v.is_printable() => invalid("value must be printable ASCII"),
        _ => Ok(()),
    }
}

/// A command that instructs an action and expects no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoCommand {
    mnemonic: &'static str,
    arity: Arity,
    summary: &'static str,
}

impl DoCommand {
    /// Bind `mnemonic` to the do shape.
    pub const fn new(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self {
            mnemonic,
            arity,
            summary,
        }
    }

    /// Wire mnemonic.
    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// Declared arity.
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Type-erased view.
    pub const fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            mnemonic: self.mnemonic,
            shape: Shape::Do,
            arity: self.arity,
            conversion: Conversion::None,
            summary: self.summary,
        }
    }

    /// Build the command line, checking the arguments against the arity.
    pub fn encode(&self, axis: Option<u8>, value: Option<&CommandValue>) -> DriverResult<String> {
        check_arity(self.mnemonic, self.arity, axis, value)?;
        Ok(codec::encode(self.mnemonic, axis, value))
    }
}

/// A query that expects exactly one reply line, converted to `T`.
#[derive(Debug)]
pub struct AskCommand<T> {
    mnemonic: &'static str,
    arity: Arity,
    convert: Converter<T>,
    conversion: Conversion,
    summary: &'static str,
}

// Manual impls: derive would require `T: Clone`/`T: Copy`.
impl<T> Clone for AskCommand<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AskCommand<T> {}

impl<T> AskCommand<T> {
    const fn with_converter(
        mnemonic: &'static str,
        arity: Arity,
        convert: Converter<T>,
        conversion: Conversion,
        summary: &'static str,
    ) -> Self {
        Self {
            mnemonic,
            arity,
            convert,
            conversion,
            summary,
        }
    }

    /// Wire mnemonic.
    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// Declared arity.
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Type-erased view.
    pub const fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            mnemonic: self.mnemonic,
            shape: Shape::Ask,
            arity: self.arity,
            conversion: self.conversion,
            summary: self.summary,
        }
    }

    /// Build the query line, checking the axis against the arity.
    pub fn encode(&self, axis: Option<u8>) -> DriverResult<String> {
        self.encode_with(axis, None)
    }

    /// Build the query line from dynamically supplied arguments. Queries
    /// never take a value, so `Some` is rejected.
    pub fn encode_with(&self, axis: Option<u8>, value: Option<&CommandValue>) -> DriverResult<String> {
        check_arity(self.mnemonic, self.arity, axis, value)?;
        Ok(codec::encode(self.mnemonic, axis, None))
    }

    /// Convert one reply payload.
    pub fn decode(&self, raw: &str) -> DriverResult<T> {
        codec::decode(raw, self.convert)
    }
}

impl AskCommand<String> {
    /// Query returning the reply text unchanged.
    pub const fn text(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self::with_converter(mnemonic, arity, identity, Conversion::Identity, summary)
    }
}

impl AskCommand<bool> {
    /// Query returning a flag.
    pub const fn flag(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self::with_converter(mnemonic, arity, conv_bool, Conversion::Bool, summary)
    }
}

impl AskCommand<i64> {
    /// Query returning an integer.
    pub const fn int(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self::with_converter(mnemonic, arity, conv_int, Conversion::Int, summary)
    }
}

impl AskCommand<f64> {
    /// Query returning a number.
    pub const fn float(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self::with_converter(mnemonic, arity, conv_float, Conversion::Float, summary)
    }
}

impl AskCommand<Vec<i64>> {
    /// Query returning comma-separated integers.
    pub const fn int_tuple(mnemonic: &'static str, arity: Arity, summary: &'static str) -> Self {
        Self::with_converter(mnemonic, arity, conv_int_tuple, Conversion::IntTuple, summary)
    }
}
