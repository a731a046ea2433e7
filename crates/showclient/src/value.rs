//! Tolerant access to loosely-typed backing-store values.
//!
//! Store rows arrive as `serde_json` maps whose leaves may be strings, numbers,
//! or absent altogether. Nothing in here fails: a missing or mistyped field
//! reads as `None` or as the caller's default.

use serde_json::{Map, Value};

/// A fetched table: row key to row object, or field to value for single rows.
pub type TableData = Map<String, Value>;

/// Never-failing scalar accessors.
pub trait TolerantValue {
    /// Renders scalars as text. Null and compound values give `None`.
    fn as_string(&self) -> Option<String>;

    /// Parses the value as a signed integer, from a number or a numeric string.
    fn as_integer(&self) -> Option<i64>;

    /// Parses the value as a float, from a number or a numeric string.
    fn as_float(&self) -> Option<f64>;
}

impl TolerantValue for Value {
    fn as_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Returns the row object stored under `key`, if it is an object.
pub fn row<'a>(table: &'a TableData, key: &str) -> Option<&'a TableData> {
    table.get(key).and_then(Value::as_object)
}

/// Returns `table[key][field]` as text, or `default`.
pub fn field_str(table: &TableData, key: &str, field: &str, default: &str) -> String {
    row(table, key)
        .and_then(|r| r.get(field))
        .and_then(TolerantValue::as_string)
        .unwrap_or_else(|| default.to_string())
}

/// Returns a top-level field of a single-row fetch as text, or `default`.
pub fn flat_str(row: &TableData, field: &str, default: &str) -> String {
    row.get(field)
        .and_then(TolerantValue::as_string)
        .unwrap_or_else(|| default.to_string())
}

/// Sums integer fields of `table[key]`, or returns `default` if any is unusable.
pub fn sum_fields(table: &TableData, key: &str, default: &str, fields: &[&str]) -> String {
    let Some(r) = row(table, key) else {
        return default.to_string();
    };
    let mut total: i64 = 0;
    for field in fields {
        match r.get(*field).and_then(TolerantValue::as_integer) {
            Some(v) => total = total.saturating_add(v),
            None => return default.to_string(),
        }
    }
    total.to_string()
}

/// True when the row object carries `field` at all.
pub fn has_field(row: &Value, field: &str) -> bool {
    row.as_object().is_some_and(|r| r.contains_key(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TableData {
        json!({
            "Ethernet0": {"speed": "100000", "mtu": 9100, "rx": "10", "tx": "5", "bad": "x"},
            "Ethernet4": "not-an-object",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_as_string_scalars() {
        assert_eq!(json!("up").as_string(), Some("up".to_string()));
        assert_eq!(json!(42).as_string(), Some("42".to_string()));
        assert_eq!(json!(true).as_string(), Some("true".to_string()));
        assert_eq!(Value::Null.as_string(), None);
        assert_eq!(json!({"a": 1}).as_string(), None);
    }

    #[test]
    fn test_as_integer_tolerates_strings() {
        assert_eq!(json!("17").as_integer(), Some(17));
        assert_eq!(json!(" 17 ").as_integer(), Some(17));
        assert_eq!(json!("seventeen").as_integer(), None);
        assert_eq!(json!(3).as_integer(), Some(3));
    }

    #[test]
    fn test_field_str_defaults() {
        let t = sample();
        assert_eq!(field_str(&t, "Ethernet0", "speed", "N/A"), "100000");
        assert_eq!(field_str(&t, "Ethernet0", "mtu", "N/A"), "9100");
        assert_eq!(field_str(&t, "Ethernet0", "fec", "N/A"), "N/A");
        assert_eq!(field_str(&t, "Ethernet4", "speed", "N/A"), "N/A");
        assert_eq!(field_str(&t, "Ethernet8", "speed", "N/A"), "N/A");
    }

    #[test]
    fn test_sum_fields() {
        let t = sample();
        assert_eq!(sum_fields(&t, "Ethernet0", "N/A", &["rx", "tx"]), "15");
        assert_eq!(sum_fields(&t, "Ethernet0", "N/A", &["rx", "bad"]), "N/A");
        assert_eq!(sum_fields(&t, "Ethernet0", "N/A", &["rx", "missing"]), "N/A");
        assert_eq!(sum_fields(&t, "Ethernet8", "N/A", &["rx"]), "N/A");
    }

    #[test]
    fn test_has_field() {
        assert!(has_field(&json!({"alias": "etp0"}), "alias"));
        assert!(!has_field(&json!({"speed": "1"}), "alias"));
        assert!(!has_field(&json!("etp0"), "alias"));
    }
}
