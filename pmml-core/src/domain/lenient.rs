//! Lenient numeric decoding for provider payloads.
//!
//! The provider is inconsistent about numeric encoding: the same field can
//! arrive as a JSON number, a numeric string (`"0.4500"`), `null`, or be
//! missing entirely. These helpers decode all of those into `Option` values,
//! mapping anything unparseable to `None` instead of failing the record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a finite-or-infinite float. NaN counts as missing.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| !x.is_nan())
}

/// Interpret a JSON value as whole seconds. Fractional values are truncated.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// `deserialize_with` helper for `Option<f64>` fields.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

/// `deserialize_with` helper for `Option<i64>` fields.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_i64))
}
