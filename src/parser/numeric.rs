//! Lenient numeric coercion for telemetry fields
//!
//! Devices report numbers as JSON numbers or as strings, sometimes with a unit
//! suffix ("12.5km/h"). Coercion follows the usual script-host rules: take the
//! longest numeric prefix of a string, ignore leading whitespace, truncate
//! floats for integer fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to do with a numeric field that does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Reject at the boundary, the field keeps its last value
    #[default]
    Strict,
    /// Store NaN in float fields and let it reach the display
    Permissive,
}

impl std::str::FromStr for NumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(NumericPolicy::Strict),
            "permissive" => Ok(NumericPolicy::Permissive),
            other => Err(format!("unknown numeric policy '{other}'")),
        }
    }
}

/// Parse a float from a JSON number or the numeric prefix of a string
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse an integer from a JSON number (truncated) or the integer prefix of a string
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
            }
        }
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

/// Longest prefix of `s` (after leading whitespace) that forms a decimal float
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Longest prefix of `s` (after leading whitespace) that forms an integer,
/// accepting a `0x` prefix for hexadecimal
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if rest.len() > 2 && (rest.starts_with("0x") || rest.starts_with("0X")) {
        (16, &rest[2..])
    } else {
        (10, rest)
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
