//! Reply converters
//!
//! A converter maps one reply payload to a typed value. Parsing failures are
//! reported as [`DriverError::Conversion`]; they never touch the connection.

use crate::error::{DriverError, DriverResult};

/// Function from reply payload to typed value.
pub type Converter<T> = fn(&str) -> DriverResult<T>;

/// Pass the reply through unchanged.
pub fn identity(raw: &str) -> DriverResult<String> {
    Ok(raw.to_string())
}

/// Plain decimal text: optional sign, digits, optional fraction.
/// Rejects the `inf`/`NaN`/exponent forms `f64::from_str` accepts.
fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// `"0"` is false; any other decimal reply is true.
pub fn conv_bool(raw: &str) -> DriverResult<bool> {
    let text = raw.trim();
    if text == "0" {
        return Ok(false);
    }
    if is_decimal(text) {
        Ok(true)
    } else {
        Err(DriverError::conversion(raw, "boolean"))
    }
}

/// Decimal integer reply.
pub fn conv_int(raw: &str) -> DriverResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| DriverError::conversion(raw, "integer"))
}

/// Decimal number reply (may carry a fraction, e.g. the CL update interval).
pub fn conv_float(raw: &str) -> DriverResult<f64> {
    raw.trim()
        .parse()
        .map_err(|_| DriverError::conversion(raw, "number"))
}

/// Comma-separated decimal integers, in reply order.
pub fn conv_int_tuple(raw: &str) -> DriverResult<Vec<i64>> {
    raw.split(',')
        .map(|field| field.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| DriverError::conversion(raw, "integer tuple"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv_bool() {
        assert!(!conv_bool("0").unwrap());
        assert!(conv_bool("1").unwrap());
        assert!(conv_bool("2").unwrap());
        assert!(conv_bool("-1").unwrap());
        assert!(conv_bool(" 1 ").unwrap());
    }

    #[test]
    fn test_conv_bool_rejects_non_numeric() {
        assert!(matches!(
            conv_bool("MOTION IN PROGRESS"),
            Err(DriverError::Conversion { .. })
        ));
        assert!(conv_bool("").is_err());
        for raw in ["NaN", "inf", "-infinity", "1e3", ".", "+", "1.2.3"] {
            assert!(conv_bool(raw).is_err(), "{raw} should not convert");
        }
        assert!(conv_bool("1.5").unwrap());
    }

    #[test]
    fn test_conv_int_tuple_preserves_order_and_length() {
        assert_eq!(
            conv_int_tuple("570,8190,10,25").unwrap(),
            vec![570, 8190, 10, 25]
        );
        assert_eq!(conv_int_tuple("25,10,8190,570").unwrap(), vec![25, 10, 8190, 570]);
        assert_eq!(conv_int_tuple("7").unwrap(), vec![7]);
        assert_eq!(conv_int_tuple("-3, 4").unwrap(), vec![-3, 4]);
    }

    #[test]
    fn test_conv_int_tuple_rejects_garbage() {
        let err = conv_int_tuple("570,abc,10").unwrap_err();
        assert!(matches!(
            err,
            DriverError::Conversion {
                expected: "integer tuple",
                ..
            }
        ));
        assert!(conv_int_tuple("").is_err());
        assert!(conv_int_tuple("1,,2").is_err());
    }

    #[test]
    fn test_conv_int_and_float() {
        assert_eq!(conv_int("-2147483648").unwrap(), -2_147_483_648);
        assert!(conv_int("0.5").is_err());
        assert_eq!(conv_float("0.1").unwrap(), 0.1);
        assert_eq!(conv_float("100000").unwrap(), 100_000.0);
    }

    #[test]
    fn test_identity() {
        assert_eq!(identity("New_Focus 8743 v2.2").unwrap(), "New_Focus 8743 v2.2");
    }
}
