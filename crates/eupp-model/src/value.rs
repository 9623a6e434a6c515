//! Scalar values carried through from raw records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One decoded GRIB index message: a flat JSON object.
pub type RawRecord = serde_json::Map<String, Value>;

/// A passthrough cell value.
///
/// Raw records are schemaless JSON, so columns that the normalizer does not
/// derive are carried as one of these and typed when the table is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value; nested arrays and objects are kept as JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map_or(FieldValue::Null, FieldValue::Float),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => f.write_str(&format_numeric(*v)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Format a float without trailing zeros after the decimal point.
fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Render a scalar JSON value as text, the way the index writes it.
///
/// Returns `None` for null, arrays and objects.
pub fn json_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_scalars() {
        assert_eq!(FieldValue::from_json(&json!(12)), FieldValue::Int(12));
        assert_eq!(FieldValue::from_json(&json!(1.5)), FieldValue::Float(1.5));
        assert_eq!(
            FieldValue::from_json(&json!("sfc")),
            FieldValue::Text("sfc".to_string())
        );
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            FieldValue::Text("[1,2]".to_string())
        );
    }

    #[test]
    fn scalar_text_skips_containers() {
        assert_eq!(json_scalar_text(&json!("700")), Some("700".to_string()));
        assert_eq!(json_scalar_text(&json!(850)), Some("850".to_string()));
        assert_eq!(json_scalar_text(&json!({"a": 1})), None);
        assert_eq!(json_scalar_text(&json!(null)), None);
    }

    #[test]
    fn floats_display_without_trailing_zeros() {
        assert_eq!(FieldValue::Float(850.0).to_string(), "850");
        assert_eq!(FieldValue::Float(1.50).to_string(), "1.5");
        assert_eq!(FieldValue::Float(0.0).to_string(), "0");
    }
}
