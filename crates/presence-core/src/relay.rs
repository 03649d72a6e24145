//! `PresenceRelay`: the owned handle tying state, classifier and hub together.
//!
//! Every transport (serial feed, WebSocket clients, HTTP injection) holds a
//! clone and calls into the same `ingest` path.

use chrono::Utc;
use presence_common::IngestError;
use presence_config::RelayConfig;

use crate::classifier::Classifier;
use crate::hub::{Hub, Observer};
use crate::ingest::IngestEvent;
use crate::protocol::PresenceSnapshot;
use crate::state::{StateStore, UpdateResult};

/// Result of one accepted ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub result: UpdateResult,
    /// Presence after the update.
    pub presence: bool,
}

#[derive(Clone)]
pub struct PresenceRelay {
    store: StateStore,
    hub: Hub,
}

impl PresenceRelay {
    pub fn new(classifier: Classifier, hub: Hub) -> Self {
        Self {
            store: StateStore::new(classifier),
            hub,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Classifier::from_config(&config.classifier),
            Hub::from_config(&config.broadcast),
        )
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Unwrap a wire payload and feed it through the pipeline. Blank
    /// payloads are ignored and return `None`.
    pub async fn ingest(&self, payload: &str) -> Option<IngestOutcome> {
        let event = IngestEvent::from_payload(payload, Utc::now())?;
        Some(self.ingest_event(event).await)
    }

    /// Manual injection. Rejects blank lines before touching state.
    pub async fn inject(&self, raw: &str) -> Result<IngestOutcome, IngestError> {
        let event = IngestEvent::from_line(raw, Utc::now())
            .ok_or_else(|| IngestError::InvalidInput("raw required".into()))?;
        Ok(self.ingest_event(event).await)
    }

    /// Classify, record and fan out one line as a single atomic step.
    async fn ingest_event(&self, event: IngestEvent) -> IngestOutcome {
        let (result, state) = self.store.update(event.line(), event.received_at()).await;

        match result {
            UpdateResult::Transitioned { presence, .. } => {
                tracing::info!(presence, raw = %event.line(), "Presence changed");
            }
            UpdateResult::Unchanged => {
                tracing::debug!(raw = %event.line(), "Raw passthrough");
            }
        }

        self.hub.on_ingest_result(&result, &state, &event).await;

        IngestOutcome {
            result,
            presence: state.presence,
        }
    }

    /// Register a new observer. Holding the state lock while registering
    /// means no transition can land between the snapshot and the insert.
    pub async fn subscribe(&self) -> Observer {
        let state = self.store.lock().await;
        self.hub.register(&state.snapshot()).await
    }

    pub async fn snapshot(&self) -> PresenceSnapshot {
        self.store.snapshot().await
    }
}
