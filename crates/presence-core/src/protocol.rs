//! Wire protocol between the relay, its sensor feeds and its observers.

use chrono::{DateTime, SecondsFormat, Utc};
use presence_config::schema::TagField;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format a timestamp the way browsers print `Date.toISOString()`.
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Point-in-time copy of the presence state, as served to pollers and sent
/// to freshly connected observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSnapshot {
    pub presence: bool,
    pub last_raw: String,
    pub last_update: Option<String>,
}

/// Messages the relay pushes to observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BroadcastEvent {
    State(PresenceSnapshot),
    Raw { raw: String, timestamp: String },
    Heartbeat { timestamp: i64 },
}

impl BroadcastEvent {
    pub fn heartbeat(at: &DateTime<Utc>) -> Self {
        BroadcastEvent::Heartbeat {
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn raw(line: &str, at: &DateTime<Utc>) -> Self {
        BroadcastEvent::Raw {
            raw: line.to_string(),
            timestamp: iso_timestamp(at),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastEvent::State(_) => "state",
            BroadcastEvent::Raw { .. } => "raw",
            BroadcastEvent::Heartbeat { .. } => "heartbeat",
        }
    }

    /// Serialize to one JSON text frame, naming the discriminator `tag`.
    pub fn encode(&self, tag: TagField) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        if tag != TagField::Kind {
            if let Value::Object(map) = &mut value {
                if let Some(kind) = map.remove("kind") {
                    map.insert(tag.as_str().to_string(), kind);
                }
            }
        }
        serde_json::to_string(&value)
    }
}

/// What a network sensor client sends. Only `raw` is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMessage {
    #[serde(rename = "sensorId", default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    pub raw: String,
}
