//! Lenient field decoders for the API's loosely typed JSON.
//!
//! The backend is a PHP service and numbers routinely arrive as strings,
//! floats or `null`. These helpers are used through `deserialize_with`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Any JSON number or numeric string as `u64`, anything else as 0.
pub fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.floor() as u64)
        .unwrap_or(0))
}

/// Like [`lenient_u64`] but `null`/missing stays `None`.
pub fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.floor() as u64))
}

/// Any JSON number or numeric string as `f64`, anything else as 0.
pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).filter(|n| n.is_finite()).unwrap_or(0.0))
}

/// Truthy JSON (`true`, `1`, `"1"`, `"true"`) as `bool`.
pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

/// String or number as an optional string; ids arrive as either.
pub fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strip a Laravel resource `{ "data": ... }` envelope if present.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_u64")]
        count: u64,
        #[serde(default, deserialize_with = "lenient_f64")]
        rate: f64,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: bool,
    }

    #[test]
    fn test_numbers_from_strings() {
        let p: Probe = serde_json::from_value(json!({"count": "42", "rate": "12.5", "flag": "1"})).unwrap();
        assert_eq!(p.count, 42);
        assert_eq!(p.rate, 12.5);
        assert!(p.flag);
    }

    #[test]
    fn test_nulls_and_missing() {
        let p: Probe = serde_json::from_value(json!({"count": null})).unwrap();
        assert_eq!(p.count, 0);
        assert_eq!(p.rate, 0.0);
        assert!(!p.flag);
    }

    #[test]
    fn test_unwrap_data() {
        assert_eq!(unwrap_data(json!({"data": [1, 2]})), json!([1, 2]));
        assert_eq!(unwrap_data(json!([3])), json!([3]));
        assert_eq!(unwrap_data(json!({"id": 1})), json!({"id": 1}));
    }
}
