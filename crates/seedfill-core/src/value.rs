use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a persisted row, assigned by the storage target on create.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete field value produced by a strategy or read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    /// Elapsed time in whole seconds.
    Duration(i64),
    /// Reference to a row of another entity kind (to-one relations).
    Id(Id),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Uuid(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<Id> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Canonical text key for equality comparisons across value variants.
    pub fn key(&self) -> String {
        match self {
            Value::Null => "<null>".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) | Value::Uuid(value) => value.clone(),
            Value::Bytes(value) => format!("<bytes:{}>", value.len()),
            Value::Date(value) => value.format("%Y-%m-%d").to_string(),
            Value::Time(value) => value.format("%H:%M:%S").to_string(),
            Value::DateTime(value) => value.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            Value::Duration(seconds) => format!("<duration:{seconds}>"),
            Value::Id(id) => format!("<id:{id}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_distinguish_variants() {
        assert_ne!(Value::Text("1".to_string()).key(), Value::Id(Id(1)).key());
        assert_eq!(Value::Int(1).key(), Value::Int(1).key());
        assert!(Value::Null.is_null());
    }

    #[test]
    fn id_round_trips_through_serde() {
        let id: Id = serde_json::from_str(&serde_json::to_string(&Id(42)).unwrap()).unwrap();
        assert_eq!(id, Id(42));
    }
}
