//! Observer fan-out configuration.

use serde::{Deserialize, Serialize};

/// Name of the discriminator field in broadcast messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum TagField {
    #[default]
    Kind,
    /// What the reference dashboard reads.
    Type,
}

impl TagField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagField::Kind => "kind",
            TagField::Type => "type",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Heartbeat interval in seconds (valid range: 1-3600).
    pub heartbeat_interval_secs: u64,
    /// Outbound frames buffered per observer before it is dropped (1-4096).
    pub observer_queue: usize,
    /// Upper bound on a single socket write, in milliseconds (100-60000).
    pub send_timeout_ms: u64,
    pub tag_field: TagField,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 15,
            observer_queue: 64,
            send_timeout_ms: 5000,
            tag_field: TagField::Kind,
        }
    }
}
