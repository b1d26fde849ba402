//! Serde helpers for decimals coming from OCR and lookup payloads, which
//! mix JSON numbers, numeric strings and nulls for the same field.

use crate::error::MrlError;
use crate::parsing::values::parse_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read a decimal from a JSON value. `null` and blank strings are `None`.
pub fn decimal_from_json(value: &Value) -> Result<Option<Decimal>, MrlError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => parse_decimal(&n.to_string()).map(Some),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_decimal(s).map(Some),
        other => Err(MrlError::ParseError(format!(
            "expected a number, found {other}"
        ))),
    }
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(v) => decimal_from_json(&v).map_err(serde::de::Error::custom),
    }
}

pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    opt_decimal(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing numeric value"))
}

/// Read a JSON scalar as text. Numbers keep their JSON spelling; `null`
/// and blank strings are `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}
