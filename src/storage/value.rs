//! Stored Value Shapes
//!
//! Every value in the store is one of exactly three shapes:
//!
//! - a string: `"John Doe"`
//! - a list of strings: `["web", "sport"]`
//! - a map of string to string: `{"lang": "rust"}`
//!
//! Nothing else is accepted. Numbers, booleans, null and nested structures
//! are rejected at the boundary where untyped JSON enters the store.

use crate::storage::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value held by the store.
///
/// Serialized untagged, so the JSON form of a `Value` is the bare string,
/// array or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// Short name of the shape, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Map(map)
    }
}

/// Returns true if `value` has one of the three storable shapes.
pub fn is_valid(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::String(_) => true,
        serde_json::Value::Array(items) => items.iter().all(|v| v.is_string()),
        serde_json::Value::Object(map) => map.values().all(|v| v.is_string()),
        _ => false,
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = StoreError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        if !is_valid(&value) {
            return Err(StoreError::InvalidValueShape);
        }

        let converted = match value {
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .filter_map(|(k, v)| match v {
                        serde_json::Value::String(s) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => return Err(StoreError::InvalidValueShape),
        };

        Ok(converted)
    }
}
