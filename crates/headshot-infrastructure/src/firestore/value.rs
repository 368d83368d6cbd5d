//! Typed field values in Firestore's REST encoding.
//!
//! Every value is an object with exactly one key naming its type, e.g.
//! `{"stringValue": "x"}` or `{"arrayValue": {"values": [...]}}`.

use chrono::{DateTime, Utc};
use headshot_core::{HeadshotError, Result};
use serde_json::{Map, Value, json};

/// A document's `fields` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0
            .insert(name.to_string(), json!({ "stringValue": value.into() }));
        self
    }

    pub fn strings<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values
            .into_iter()
            .map(|v| json!({ "stringValue": v.into() }))
            .collect();
        self.0
            .insert(name.to_string(), json!({ "arrayValue": { "values": values } }));
        self
    }

    pub fn timestamp(mut self, name: &str, value: DateTime<Utc>) -> Self {
        self.0.insert(
            name.to_string(),
            json!({ "timestampValue": value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true) }),
        );
        self
    }

    fn typed(&self, name: &str, kind: &str) -> Option<&Value> {
        self.0.get(name).and_then(|v| v.get(kind))
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.typed(name, "stringValue").and_then(Value::as_str)
    }

    pub fn require_string(&self, name: &str) -> Result<String> {
        self.get_string(name)
            .map(str::to_string)
            .ok_or_else(|| missing(name))
    }

    /// String elements of an array field. Absent or empty arrays yield `[]`.
    pub fn get_strings(&self, name: &str) -> Vec<String> {
        self.typed(name, "arrayValue")
            .and_then(|array| array.get("values"))
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.typed(name, "timestampValue")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

fn missing(name: &str) -> HeadshotError {
    HeadshotError::data_access(format!("Document is missing field '{}'", name))
}
