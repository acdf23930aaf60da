use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

mod memory;
#[cfg(test)]
mod test;

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(val: f64) -> Self {
        FieldValue::Float(val)
    }
}

impl From<&str> for FieldValue {
    fn from(val: &str) -> Self {
        FieldValue::Text(val.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(val: String) -> Self {
        FieldValue::Text(val)
    }
}

/// A single time-series point, the unit every store reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub time: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: &str, time: DateTime<Utc>) -> Self {
        Point {
            measurement: measurement.to_owned(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            time,
        }
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn field<V: Into<FieldValue>>(mut self, key: &str, value: V) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(FieldValue::Float(val)) => Some(*val),
            _ => None,
        }
    }

    /// Looks up a tag first and falls back to a text field
    pub(crate) fn required(&self, key: &str) -> Result<String, StoreError> {
        self.tag_value(key)
            .or_else(|| self.text(key))
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Malformed {
                measurement: self.measurement.clone(),
                reason: format!("missing {}", key),
            })
    }
}

/// Append-and-query access to the time-series backend.
///
/// Series are addressed by measurement and a single key tag, which is
/// all the topology model needs.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn write(&self, point: Point) -> Result<(), StoreError>;

    /// Most recent point per distinct `key_tag` value, optionally
    /// restricted to a single key
    async fn latest(
        &self,
        measurement: &str,
        key_tag: &str,
        key: Option<&str>,
    ) -> Result<Vec<Point>, StoreError>;

    /// Points of one key within `[from, until)`, oldest first
    async fn range(
        &self,
        measurement: &str,
        key_tag: &str,
        key: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Point>, StoreError>;

    /// Removes every point of a key, no-op if there is none
    async fn delete(&self, measurement: &str, key_tag: &str, key: &str) -> Result<(), StoreError>;
}
