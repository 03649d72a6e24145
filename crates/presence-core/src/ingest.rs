//! Lenient normalization of incoming payloads to plain text lines.
//!
//! Every transport (serial line, WebSocket frame, manual injection) funnels
//! through here. A payload that is a JSON object with a `raw` field is
//! unwrapped to that field; anything else is taken verbatim. Parsing never
//! fails.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Render a JSON value as a text line. Strings are taken as-is; other values
/// become their JSON text.
pub fn value_to_line(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract the sensor line from a wire payload.
pub fn unwrap_payload(payload: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(payload) {
        if let Some(raw) = map.get("raw") {
            return value_to_line(raw);
        }
    }
    payload.to_string()
}

/// One normalized line entering the presence pipeline. The line is trimmed
/// and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEvent {
    line: String,
    received_at: DateTime<Utc>,
}

impl IngestEvent {
    /// Normalize a line that was already unwrapped. `None` for blank lines.
    pub fn from_line(line: &str, received_at: DateTime<Utc>) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(Self {
            line: line.to_string(),
            received_at,
        })
    }

    /// Unwrap and normalize a wire payload. `None` for blank lines.
    pub fn from_payload(payload: &str, received_at: DateTime<Utc>) -> Option<Self> {
        Self::from_line(&unwrap_payload(payload), received_at)
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}
