//! Lenient field decoders shared by the platform adapters.
//!
//! Platform APIs disagree on whether amounts, ids and quantities are JSON
//! numbers or strings, and several send `""` or `null` for "not set". These
//! helpers fold all of that into the `String`/`Option<String>`/integer shapes
//! the adapters work with.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes a string, number, or null as an optional trimmed string.
///
/// Empty strings are treated as absent.
pub(crate) fn opt_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

/// Like [`opt_lenient_string`] but yields `""` for absent values.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(&Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Decodes an integer sent as a number or numeric string; anything else is 0.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            // Truncation is intended: quantities like 3.0 come back as floats.
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |f| f as i64),
        _ => 0,
    })
}

/// Decodes an optional integer; `null`, `""` and non-numeric text are `None`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn opt_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parses a decimal amount, accepting surrounding whitespace.
pub(crate) fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Renders an amount with exactly two decimals, e.g. `"129.90"`.
pub(crate) fn format_price(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}
