//! Command codec
//!
//! Pure translation between command parts and wire lines. A command line is
//! `[axis][mnemonic][value]` with no separators; each part is rendered only
//! if supplied. Terminators are added and stripped by the transport.

use std::fmt;

use crate::error::DriverResult;
use crate::protocol::convert::Converter;

/// Value argument of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandValue {
    /// Rendered in decimal
    Int(i64),
    /// Rendered with the shortest representation that round-trips
    Float(f64),
    /// Rendered verbatim (e.g. `+`/`-` direction for MT, MZ, MV)
    Text(String),
    /// Rendered comma-separated (e.g. the four AE encoder parameters)
    Ints(Vec<i64>),
}

impl CommandValue {
    /// Whether the rendered value can be placed on a command line.
    ///
    /// Line terminators or other control bytes would split the command and
    /// desynchronize the reply stream.
    pub fn is_printable(&self) -> bool {
        match self {
            CommandValue::Text(text) => text.bytes().all(|b| b.is_ascii_graphic() || b == b' '),
            CommandValue::Float(v) => v.is_finite(),
            CommandValue::Int(_) | CommandValue::Ints(_) => true,
        }
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandValue::Int(v) => write!(f, "{}", v),
            CommandValue::Float(v) => write!(f, "{}", v),
            CommandValue::Text(v) => f.write_str(v),
            CommandValue::Ints(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i32> for CommandValue {
    fn from(v: i32) -> Self {
        CommandValue::Int(v.into())
    }
}

impl From<i64> for CommandValue {
    fn from(v: i64) -> Self {
        CommandValue::Int(v)
    }
}

impl From<u8> for CommandValue {
    fn from(v: u8) -> Self {
        CommandValue::Int(v.into())
    }
}

impl From<u32> for CommandValue {
    fn from(v: u32) -> Self {
        CommandValue::Int(v.into())
    }
}

impl From<bool> for CommandValue {
    fn from(v: bool) -> Self {
        CommandValue::Int(i64::from(v))
    }
}

impl From<f64> for CommandValue {
    fn from(v: f64) -> Self {
        CommandValue::Float(v)
    }
}

impl From<char> for CommandValue {
    fn from(v: char) -> Self {
        CommandValue::Text(v.to_string())
    }
}

impl From<&str> for CommandValue {
    fn from(v: &str) -> Self {
        CommandValue::Text(v.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(v: String) -> Self {
        CommandValue::Text(v)
    }
}

impl From<Vec<i64>> for CommandValue {
    fn from(v: Vec<i64>) -> Self {
        CommandValue::Ints(v)
    }
}

impl From<&[i64]> for CommandValue {
    fn from(v: &[i64]) -> Self {
        CommandValue::Ints(v.to_vec())
    }
}

/// Build the command line for `mnemonic`.
///
/// ```
/// use newfocus8743::protocol::codec::encode;
///
/// assert_eq!(encode("MM", Some(1), Some(&0.into())), "1MM0");
/// assert_eq!(encode("AF?", Some(2), None), "2AF?");
/// assert_eq!(encode("*IDN?", None, None), "*IDN?");
/// ```
pub fn encode(mnemonic: &str, axis: Option<u8>, value: Option<&CommandValue>) -> String {
    let mut line = String::with_capacity(mnemonic.len() + 8);
    if let Some(axis) = axis {
        line.push_str(&axis.to_string());
    }
    line.push_str(mnemonic);
    if let Some(value) = value {
        line.push_str(&value.to_string());
    }
    line
}

/// Apply `converter` to a reply payload (terminator already stripped).
pub fn decode<T>(raw: &str, converter: Converter<T>) -> DriverResult<T> {
    converter(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::convert::{conv_bool, conv_int_tuple, identity};

    #[test]
    fn test_encode_part_ordering() {
        assert_eq!(encode("PA", Some(1), Some(&CommandValue::Int(-200))), "1PA-200");
        assert_eq!(encode("TP?", Some(2), None), "2TP?");
        assert_eq!(encode("SA", None, Some(&CommandValue::Int(3))), "SA3");
        assert_eq!(encode("AB", None, None), "AB");
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(CommandValue::from(0.1).to_string(), "0.1");
        assert_eq!(CommandValue::from(100000.0).to_string(), "100000");
        assert_eq!(CommandValue::from('+').to_string(), "+");
        assert_eq!(CommandValue::from(true).to_string(), "1");
        assert_eq!(
            CommandValue::from(vec![570, 8190, 10, 25]).to_string(),
            "570,8190,10,25"
        );
    }

    #[test]
    fn test_printable_check() {
        assert!(CommandValue::from("+").is_printable());
        assert!(!CommandValue::from("1\r2").is_printable());
        assert!(!CommandValue::from(f64::NAN).is_printable());
        assert!(CommandValue::from(42).is_printable());
    }

    #[test]
    fn test_identity_decode_returns_echoed_value() {
        for (axis, value) in [(Some(1), CommandValue::Int(570)), (None, CommandValue::from("-"))] {
            let line = encode("DB", axis, Some(&value));
            let echoed = &line[line.find("DB").map(|i| i + 2).unwrap()..];
            assert_eq!(decode(echoed, identity).unwrap(), value.to_string());
        }
    }

    #[test]
    fn test_decode_applies_converter() {
        assert!(decode("1", conv_bool).unwrap());
        assert_eq!(decode("1,2,3", conv_int_tuple).unwrap(), vec![1, 2, 3]);
    }
}
