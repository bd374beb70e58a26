//! Lenient amount coercion for loosely typed server payloads.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Incoming JSON numbers are converted to `Decimal` once, here, and every
//! value that cannot be read as a finite number becomes zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Largest scale `Decimal` can represent.
const MAX_SCALE: u32 = 28;

/// Coerces a JSON value into a decimal amount.
///
/// Numbers and numeric strings are read as-is; `null`, booleans, objects,
/// arrays, blank strings and anything unparseable (`"NaN"`, `"Infinity"`,
/// `"1,000"`) become zero.
#[must_use]
pub fn coerce_amount(value: &Value) -> Decimal {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| number.as_u64().map(Decimal::from))
            .or_else(|| parse_decimal(&number.to_string()))
            .or_else(|| number.as_f64().and_then(Decimal::from_f64))
            .unwrap_or(Decimal::ZERO),
        Value::String(text) => parse_decimal(text.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Serde adapter for amount fields that may be missing or malformed.
///
/// Use together with `#[serde(default)]` so an absent field also becomes zero.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(Decimal::ZERO, coerce_amount))
}

/// Reads an identifier that the server may send as a string or a number.
#[must_use]
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Serde adapter for identifier fields sent as strings or numbers.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_id))
}

/// Reads a text field that the server may send as a string, number or bool.
///
/// Strings pass through untouched; `null`, objects and arrays read as absent.
#[must_use]
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Serde adapter for free-text fields of uncertain JSON type.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_text))
}

/// Converts an integer amount in minor units (cents) to a decimal amount.
#[must_use]
pub fn from_minor_units(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale.min(MAX_SCALE))
}

#[cfg(test)]
#[path = "amount_tests.rs"]
mod tests;
