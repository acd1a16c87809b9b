//! Coercion of untyped upstream JSON fields into finite numbers.
//!
//! Exchanges are inconsistent about sending prices as strings or numbers,
//! so every numeric field read from a third-party payload goes through
//! [`parse_number`].

use crate::error::UpstreamError;
use serde_json::Value;

/// Parse a JSON number or numeric string into a finite `f64`.
///
/// Strings are trimmed and parsed without any locale handling. NaN and
/// infinities are rejected, as are empty strings, `null`, booleans, arrays
/// and objects.
pub fn parse_number(raw: &Value, label: &str) -> Result<f64, UpstreamError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(UpstreamError::invalid_field(label, raw)),
    }
}

/// Look up `key` on a JSON object and coerce it with [`parse_number`].
pub fn field(obj: &Value, key: &str, label: &str) -> Result<f64, UpstreamError> {
    match obj.get(key) {
        Some(raw) => parse_number(raw, label),
        None => Err(UpstreamError::invalid_field(label, "<missing>")),
    }
}
