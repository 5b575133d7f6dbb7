//! Coercion of loosely-typed numeric input into non-negative amounts.
//!
//! Numbers reach the model from two places: text typed into a form field and
//! values decoded from the persisted blob. Neither path is allowed to fail or
//! to store a negative value; anything unusable becomes `0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse form input with integer-prefix semantics.
///
/// Leading whitespace and an optional sign are accepted, then the longest run
/// of ASCII digits is taken. No digits, or a negative sign, yields `0`.
/// Values beyond `u64::MAX` saturate.
///
/// ```
/// use kolbudget_core::model::coerce::parse_amount;
/// assert_eq!(parse_amount("1500"), 1500);
/// assert_eq!(parse_amount("  12abc"), 12);
/// assert_eq!(parse_amount("abc"), 0);
/// assert_eq!(parse_amount("-5"), 0);
/// ```
#[must_use]
pub fn parse_amount(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: u64 = 0;
    let mut seen_digit = false;
    for digit in digits {
        seen_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(digit - b'0'));
    }

    if !seen_digit || negative {
        return 0;
    }
    value
}

/// Coerce a decoded JSON value into an amount.
///
/// Unsigned integers pass through, finite positive floats truncate toward
/// zero, numeric strings are parsed strictly, and everything else
/// (negatives, `null`, booleans, containers, garbage strings) becomes `0`.
#[must_use]
pub fn amount_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(float_to_amount))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse::<f64>().map_or(0, float_to_amount),
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_amount(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // `as` saturates for out-of-range floats.
        value.trunc() as u64
    } else {
        0
    }
}

/// `deserialize_with` adapter applying [`amount_from_value`].
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON at all.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount_from_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_plain_digits() {
        assert_eq!(parse_amount("0"), 0);
        assert_eq!(parse_amount("86000"), 86_000);
        assert_eq!(parse_amount("+42"), 42);
    }

    #[test]
    fn parse_takes_integer_prefix() {
        assert_eq!(parse_amount("12.9"), 12);
        assert_eq!(parse_amount("7 KOLs"), 7);
        assert_eq!(parse_amount("\t 3"), 3);
    }

    #[test]
    fn parse_invalid_is_zero() {
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("   "), 0);
        assert_eq!(parse_amount("-"), 0);
        assert_eq!(parse_amount("x12"), 0);
        assert_eq!(parse_amount("-250"), 0);
    }

    #[test]
    fn parse_saturates_on_overflow() {
        assert_eq!(parse_amount("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn value_coercion() {
        assert_eq!(amount_from_value(&json!(1500)), 1500);
        assert_eq!(amount_from_value(&json!(-3)), 0);
        assert_eq!(amount_from_value(&json!(2.75)), 2);
        assert_eq!(amount_from_value(&json!(-2.75)), 0);
        assert_eq!(amount_from_value(&json!("400")), 400);
        assert_eq!(amount_from_value(&json!("4x")), 0);
        assert_eq!(amount_from_value(&json!(null)), 0);
        assert_eq!(amount_from_value(&json!(true)), 0);
        assert_eq!(amount_from_value(&json!([1])), 0);
    }
}
