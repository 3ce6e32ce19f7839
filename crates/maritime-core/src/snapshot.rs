use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Raw tracking API response for one vessel.
///
/// The body is kept opaque; only `timestamp` is ever added to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselSnapshot {
    fields: Map<String, Value>,
}

impl VesselSnapshot {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(TIMESTAMP_FIELD).and_then(Value::as_str)
    }

    pub(crate) fn stamp(&mut self, timestamp: &str) {
        self.fields.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(timestamp.to_string()),
        );
    }
}

impl From<Map<String, Value>> for VesselSnapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
