//! JSON record source.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single object: `{"a":1}`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Numbers become integers when they fit `i64`/`u64` and floats otherwise. Nested arrays and
//! objects are kept as their compact JSON text.

use std::fs;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::types::{Record, Value};

/// Read JSON records from a file.
pub fn records_from_path(path: impl AsRef<Path>) -> IngestResult<Vec<Record>> {
    let text = fs::read_to_string(path)?;
    records_from_str(&text)
}

/// Read JSON records from an in-memory string.
pub fn records_from_str(input: &str) -> IngestResult<Vec<Record>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => records_from_values(&items),
            serde_json::Value::Object(_) => records_from_values(&[v]),
            _ => Err(IngestError::InvalidInput {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| IngestError::InvalidInput {
                message: format!("invalid ndjson at line {}: {}", i + 1, e),
            })?;
            values.push(v);
        }
        records_from_values(&values)
    }
}

fn records_from_values(values: &[serde_json::Value]) -> IngestResult<Vec<Record>> {
    let mut records = Vec::with_capacity(values.len());
    for (idx0, v) in values.iter().enumerate() {
        let obj = v.as_object().ok_or_else(|| IngestError::InvalidInput {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;
        let record: Record = obj
            .iter()
            .map(|(k, v)| (k.as_str(), convert_json_value(v)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn convert_json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Float64)
            }
        }
        serde_json::Value::String(s) => Value::text(s.as_str()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::text(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_integer_vs_float_distinction() {
        let records = records_from_str(r#"{"a":1,"b":1.5,"c":18446744073709551615}"#).unwrap();
        assert_eq!(records[0].get("a"), Some(&Value::Int64(1)));
        assert_eq!(records[0].get("b"), Some(&Value::Float64(1.5)));
        assert_eq!(records[0].get("c"), Some(&Value::UInt64(u64::MAX)));
    }

    #[test]
    fn nested_values_become_json_text() {
        let records = records_from_str(r#"[{"tags":["x","y"]}]"#).unwrap();
        assert_eq!(records[0].get("tags"), Some(&Value::text(r#"["x","y"]"#)));
    }

    #[test]
    fn scalar_top_level_is_rejected() {
        assert!(matches!(records_from_str("42"), Err(IngestError::InvalidInput { .. })));
    }
}
