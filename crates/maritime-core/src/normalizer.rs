use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::snapshot::VesselSnapshot;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// Display fields pulled out of a snapshot.
///
/// Field names mirror the tracking payload (`main.type`, `main.lat`,
/// `main.lon`, `maritime[0].description`). The `type` label and the compass
/// suffixes on the coordinates are display placeholders; nothing here checks
/// that they mean what they say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselReport {
    pub vessel_type: String,
    pub lat: String,
    pub lon: String,
    pub description: String,
}

impl VesselReport {
    pub fn summary(&self, name: &str) -> String {
        format!(
            "Ship: {name}\nType: {}\nLocation: {}°N, {}°E\nStatus: {}",
            self.vessel_type, self.lat, self.lon, self.description
        )
    }
}

/// Pulls the display fields out of a snapshot.
///
/// Missing or `null` fields fall back to `Unknown`/`N/A`. Only containers of
/// the wrong shape are errors.
pub fn extract(snapshot: &VesselSnapshot) -> Result<VesselReport, ExtractionError> {
    let main = object_field(snapshot.fields(), "main")?;
    let status = first_status(snapshot.fields())?;

    Ok(VesselReport {
        vessel_type: render(main.and_then(|m| m.get("type")), UNKNOWN),
        lat: render(main.and_then(|m| m.get("lat")), NOT_AVAILABLE),
        lon: render(main.and_then(|m| m.get("lon")), NOT_AVAILABLE),
        description: render(status.and_then(|s| s.get("description")), UNKNOWN),
    })
}

pub fn fetch_failure_line(name: &str) -> String {
    format!("Failed to fetch data for {name}")
}

pub fn extraction_failure_line(name: &str, err: &ExtractionError) -> String {
    format!("Error processing data for {name}: {err}")
}

fn object_field<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ExtractionError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(ExtractionError::ExpectedObject { field }),
    }
}

fn first_status(
    fields: &Map<String, Value>,
) -> Result<Option<&Map<String, Value>>, ExtractionError> {
    let entries = match fields.get("maritime") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ExtractionError::ExpectedArray { field: "maritime" }),
    };

    match entries.first() {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entry)) => Ok(Some(entry)),
        Some(_) => Err(ExtractionError::ExpectedObject {
            field: "maritime[0]",
        }),
    }
}

fn render(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
