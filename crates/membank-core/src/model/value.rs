//! Field values as seen by record types and by the storage boundary

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::record_type::FieldType;

/// A single field value
///
/// `Null` marks an absent value. Booleans and timestamps only exist on the
/// record side; rows read from storage carry their SQLite representation
/// until the codec coerces them into the declared field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Absent or empty text, the trigger for auto-derived fields
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Bool(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Convert into the declared field type
    ///
    /// Accepts both the record-side representation and the storage-side one
    /// (booleans as 0/1 integers, timestamps as RFC 3339 text). Returns
    /// `None` when the value cannot represent the type.
    pub fn coerce(self, field_type: &FieldType) -> Option<Value> {
        match (field_type, self) {
            (_, Value::Null) => Some(Value::Null),
            (FieldType::Text, v @ Value::Text(_)) => Some(v),
            (FieldType::Integer, v @ Value::Integer(_)) => Some(v),
            (FieldType::Real, v @ Value::Real(_)) => Some(v),
            (FieldType::Real, Value::Integer(i)) => Some(Value::Real(i as f64)),
            (FieldType::Boolean, v @ Value::Bool(_)) => Some(v),
            (FieldType::Boolean, Value::Integer(0)) => Some(Value::Bool(false)),
            (FieldType::Boolean, Value::Integer(1)) => Some(Value::Bool(true)),
            (FieldType::Timestamp, v @ Value::Timestamp(_)) => Some(v),
            (FieldType::Timestamp, Value::Text(s)) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc))),
            _ => None,
        }
    }

    /// Representation written to storage: null, integer, real or text
    pub fn to_storage(&self) -> Value {
        match self {
            Value::Bool(b) => Value::Integer(i64::from(*b)),
            Value::Timestamp(ts) => {
                Value::Text(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
            other => other.clone(),
        }
    }

    /// Plain JSON rendering (no type tags), for display surfaces
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Timestamp(_) => match self.to_storage() {
                Value::Text(s) => serde_json::Value::String(s),
                _ => serde_json::Value::Null,
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
