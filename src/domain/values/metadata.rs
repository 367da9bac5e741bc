use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metadata value. Closed set so records stay serializable by every store.
///
/// Untagged: timestamps serialize as RFC 3339 strings, so a string that
/// parses as RFC 3339 comes back as a `Timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Bool(b) => Ok(MetadataValue::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(MetadataValue::Number)
                .ok_or_else(|| format!("Unrepresentable number: {n}")),
            serde_json::Value::String(s) => Ok(match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => MetadataValue::Timestamp(dt.with_timezone(&Utc)),
                Err(_) => MetadataValue::Text(s),
            }),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(MetadataValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(MetadataValue::List),
            serde_json::Value::Null => Err("Null metadata values are not supported".into()),
            serde_json::Value::Object(_) => Err("Nested metadata objects are not supported".into()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(dt: DateTime<Utc>) -> Self {
        MetadataValue::Timestamp(dt)
    }
}

/// String-keyed metadata attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a JSON object, rejecting nulls and nested objects.
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| {
                    MetadataValue::from_json(v)
                        .map(|v| (k.clone(), v))
                        .map_err(|e| format!("metadata key '{k}': {e}"))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Metadata),
            other => Err(format!("Metadata must be a JSON object, got {other}")),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
