//! Literal values carried by conditions.
//!
//! Values are rendered as their textual SQL representation. The renderer does
//! not escape or bind anything: whoever executes the generated text owns that
//! concern.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A literal value used on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL literal
    Null,
    /// Boolean
    Bool(bool),
    /// Integer of any width
    Int(i64),
    /// Double-precision float
    Double(f64),
    /// Exact numeric
    Decimal(Decimal),
    /// Text
    String(String),
    /// UUID
    Uuid(Uuid),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp without timezone
    Timestamp(NaiveDateTime),
    /// JSON document, rendered as quoted text
    Json(JsonValue),
    /// List of values, only valid for IN / NOT IN
    List(Vec<Value>),
}

impl Value {
    /// Returns true for list-shaped values.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns a short name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
            Value::List(_) => "list",
        }
    }

    /// Unquoted text of a scalar value, used to build LIKE patterns.
    pub fn raw_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::Uuid(u) => u.to_string(),
            Value::Date(d) => d.to_string(),
            Value::Timestamp(ts) => ts.to_string(),
            Value::Json(j) => j.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::raw_text)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Renders the value as a SQL literal.
    pub fn to_sql(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) | Value::Int(_) | Value::Double(_) | Value::Decimal(_) => self.raw_text(),
            Value::String(_) | Value::Uuid(_) | Value::Date(_) | Value::Timestamp(_) | Value::Json(_) => {
                format!("'{}'", self.raw_text())
            }
            Value::List(items) => format!(
                "({})",
                items.iter().map(Value::to_sql).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scalar_literals() {
        assert_eq!(Value::from(10).to_sql(), "10");
        assert_eq!(Value::from(2.5).to_sql(), "2.5");
        assert_eq!(Value::from(true).to_sql(), "true");
        assert_eq!(Value::Null.to_sql(), "null");
        assert_eq!(Value::from("Ana").to_sql(), "'Ana'");
        assert_eq!(Value::from(Decimal::from_str("19.90").unwrap()).to_sql(), "19.90");
    }

    #[test]
    fn test_temporal_literals_are_quoted() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Value::from(date).to_sql(), "'2024-03-01'");

        let ts = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(Value::from(ts).to_sql(), "'2024-03-01 08:30:00'");
    }

    #[test]
    fn test_list_literal() {
        let v = Value::from(vec![1, 2, 3]);
        assert!(v.is_list());
        assert_eq!(v.to_sql(), "(1, 2, 3)");

        let v = Value::from(vec!["a", "b"]);
        assert_eq!(v.to_sql(), "('a', 'b')");
    }

    #[test]
    fn test_strings_are_not_escaped() {
        assert_eq!(Value::from("O'Brien").to_sql(), "'O'Brien'");
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7)), Value::Int(7));
    }

    #[test]
    fn test_raw_text() {
        assert_eq!(Value::from("abc").raw_text(), "abc");
        assert_eq!(Value::from(42).raw_text(), "42");
        assert_eq!(Value::from(serde_json::json!({"a": 1})).to_sql(), "'{\"a\":1}'");
    }
}
