//! Broadcast hub: the registry of connected observers and fan-out to them.
//!
//! Each observer owns a bounded FIFO queue; the hub only ever `try_send`s
//! into it, so a stalled observer can never block a broadcast. An observer
//! whose queue is full or closed is dropped from the registry, which closes
//! its queue and ends its connection task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use presence_common::ObserverId;
use presence_config::schema::{BroadcastConfig, TagField};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use crate::ingest::IngestEvent;
use crate::protocol::{BroadcastEvent, PresenceSnapshot};
use crate::state::{PresenceState, UpdateResult};

/// Encoded frame shared by every observer of one broadcast.
pub type Frame = Arc<str>;

/// The receiving half handed to an observer's connection task.
#[derive(Debug)]
pub struct Observer {
    pub id: ObserverId,
    pub rx: mpsc::Receiver<Frame>,
}

/// Thread-safe observer registry.
#[derive(Clone)]
pub struct Hub {
    observers: Arc<RwLock<HashMap<ObserverId, mpsc::Sender<Frame>>>>,
    queue_capacity: usize,
    tag: TagField,
}

impl Hub {
    pub fn new(queue_capacity: usize, tag: TagField) -> Self {
        Self {
            observers: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity: queue_capacity.max(1),
            tag,
        }
    }

    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self::new(config.observer_queue, config.tag_field)
    }

    fn encode(&self, event: &BroadcastEvent) -> Option<Frame> {
        match event.encode(self.tag) {
            Ok(json) => Some(Arc::from(json)),
            Err(e) => {
                tracing::error!(kind = event.kind(), error = %e, "Failed to encode broadcast");
                None
            }
        }
    }

    /// Add an observer. Its queue starts with `snapshot`, so the snapshot is
    /// always the first frame it sees.
    pub async fn register(&self, snapshot: &PresenceSnapshot) -> Observer {
        let id = ObserverId::next();
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        if let Some(frame) = self.encode(&BroadcastEvent::State(snapshot.clone())) {
            // Fresh queue with capacity >= 1: cannot be full or closed.
            let _ = tx.try_send(frame);
        }

        let mut map = self.observers.write().await;
        map.insert(id, tx);
        tracing::info!(observer = %id, observers = map.len(), "Observer registered");

        Observer { id, rx }
    }

    /// Remove an observer. Returns false if it was already gone.
    pub async fn unregister(&self, id: ObserverId) -> bool {
        let mut map = self.observers.write().await;
        let removed = map.remove(&id).is_some();
        if removed {
            tracing::info!(observer = %id, observers = map.len(), "Observer removed");
        }
        removed
    }

    /// Push one event to every observer. Returns how many accepted it.
    pub async fn broadcast(&self, event: &BroadcastEvent) -> usize {
        let Some(frame) = self.encode(event) else {
            return 0;
        };

        let targets: Vec<(ObserverId, mpsc::Sender<Frame>)> = {
            let map = self.observers.read().await;
            map.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(observer = %id, "Observer queue full, dropping observer");
                    dead.push(id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(observer = %id, "Observer queue closed");
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            let mut map = self.observers.write().await;
            for id in dead {
                map.remove(&id);
            }
        }

        delivered
    }

    /// Fan out the result of one ingest: a full `state` on transition, the
    /// event's own line otherwise.
    pub async fn on_ingest_result(
        &self,
        result: &UpdateResult,
        state: &PresenceState,
        event: &IngestEvent,
    ) -> usize {
        let event = match result {
            UpdateResult::Transitioned { .. } => BroadcastEvent::State(state.snapshot()),
            UpdateResult::Unchanged => BroadcastEvent::raw(event.line(), &event.received_at()),
        };
        self.broadcast(&event).await
    }

    pub async fn heartbeat(&self) -> usize {
        self.broadcast(&BroadcastEvent::heartbeat(&Utc::now())).await
    }

    /// Send a heartbeat every `interval`, starting one interval from now.
    pub fn spawn_heartbeat(&self, interval: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let delivered = hub.heartbeat().await;
                tracing::trace!(observers = delivered, "Heartbeat tick");
            }
        })
    }

    /// Number of registered observers.
    pub async fn count(&self) -> usize {
        self.observers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn initial() -> PresenceSnapshot {
        PresenceState::default().snapshot()
    }

    fn parse(frame: &Frame) -> Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn register_sends_one_snapshot_first() {
        let hub = Hub::new(8, TagField::Kind);
        let mut obs = hub.register(&initial()).await;

        let first = parse(&obs.rx.recv().await.unwrap());
        assert_eq!(first["kind"], "state");
        assert_eq!(first["presence"], false);
        assert!(first["lastUpdate"].is_null());
        assert!(obs.rx.try_recv().is_err());
        assert_eq!(hub.count().await, 1);
    }

    #[tokio::test]
    async fn fan_out_reaches_every_observer_identically() {
        let hub = Hub::new(8, TagField::Kind);
        let mut observers = Vec::new();
        for _ in 0..5 {
            let mut obs = hub.register(&initial()).await;
            obs.rx.recv().await.unwrap();
            observers.push(obs);
        }

        let classifier = crate::classifier::Classifier::full();
        let mut state = PresenceState::default();
        let event = IngestEvent::from_line("targets=2", Utc::now()).unwrap();
        let result = state.apply(event.line(), &classifier, event.received_at());
        let delivered = hub.on_ingest_result(&result, &state, &event).await;
        assert_eq!(delivered, 5);

        let mut frames = Vec::new();
        for obs in &mut observers {
            let frame = obs.rx.recv().await.unwrap();
            assert!(obs.rx.try_recv().is_err());
            frames.push(frame);
        }
        let first = parse(&frames[0]);
        assert_eq!(first["kind"], "state");
        assert_eq!(first["presence"], true);
        assert_eq!(first["lastRaw"], "targets=2");
        assert!(frames.iter().all(|f| **f == *frames[0]));
    }

    #[tokio::test]
    async fn unchanged_broadcasts_raw() {
        let hub = Hub::new(8, TagField::Kind);
        let mut obs = hub.register(&initial()).await;
        obs.rx.recv().await.unwrap();

        let classifier = crate::classifier::Classifier::full();
        let mut state = PresenceState::default();
        let now = Utc::now();
        let event = IngestEvent::from_line("targets=0", now).unwrap();
        let result = state.apply(event.line(), &classifier, now);
        hub.on_ingest_result(&result, &state, &event).await;

        let frame = parse(&obs.rx.recv().await.unwrap());
        assert_eq!(frame["kind"], "raw");
        assert_eq!(frame["raw"], "targets=0");
        assert_eq!(frame["timestamp"], crate::protocol::iso_timestamp(&now));
    }

    #[tokio::test]
    async fn raw_frame_carries_the_event_line_not_stored_state() {
        let hub = Hub::new(8, TagField::Kind);
        let mut obs = hub.register(&initial()).await;
        obs.rx.recv().await.unwrap();

        let state = PresenceState {
            last_raw: "targets=0".into(),
            ..PresenceState::default()
        };
        let event = IngestEvent::from_line("noise", Utc::now()).unwrap();
        hub.on_ingest_result(&UpdateResult::Unchanged, &state, &event)
            .await;

        let frame = parse(&obs.rx.recv().await.unwrap());
        assert_eq!(frame["raw"], "noise");
    }

    #[tokio::test]
    async fn closed_observer_is_removed_without_affecting_others() {
        let hub = Hub::new(8, TagField::Kind);
        let gone = hub.register(&initial()).await;
        let mut alive = hub.register(&initial()).await;
        alive.rx.recv().await.unwrap();
        drop(gone);

        let delivered = hub.heartbeat().await;
        assert_eq!(delivered, 1);
        assert_eq!(hub.count().await, 1);

        let frame = parse(&alive.rx.recv().await.unwrap());
        assert_eq!(frame["kind"], "heartbeat");
        assert!(frame["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn slow_observer_is_dropped_when_queue_fills() {
        let hub = Hub::new(2, TagField::Kind);
        // Never drained: snapshot + one heartbeat fill it.
        let slow = hub.register(&initial()).await;
        let mut fast = hub.register(&initial()).await;

        for _ in 0..3 {
            hub.heartbeat().await;
            while fast.rx.try_recv().is_ok() {}
        }
        assert_eq!(hub.count().await, 1);

        // The dropped observer sees its queued frames, then end of stream.
        let mut slow_rx = slow.rx;
        assert!(slow_rx.recv().await.is_some());
        assert!(slow_rx.recv().await.is_some());
        assert!(slow_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn frames_arrive_in_broadcast_order() {
        let hub = Hub::new(16, TagField::Kind);
        let mut obs = hub.register(&initial()).await;
        obs.rx.recv().await.unwrap();

        let now = Utc::now();
        for line in ["a", "b", "c"] {
            hub.broadcast(&BroadcastEvent::raw(line, &now)).await;
        }
        for expected in ["a", "b", "c"] {
            let frame = parse(&obs.rx.recv().await.unwrap());
            assert_eq!(frame["raw"], expected);
        }
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = Hub::new(4, TagField::Kind);
        let obs = hub.register(&initial()).await;
        assert!(hub.unregister(obs.id).await);
        assert!(!hub.unregister(obs.id).await);
        assert_eq!(hub.count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_with_no_observers() {
        let hub = Hub::new(4, TagField::Kind);
        assert_eq!(hub.heartbeat().await, 0);
    }

    #[tokio::test]
    async fn type_tag_is_used_on_the_wire() {
        let hub = Hub::new(4, TagField::Type);
        let mut obs = hub.register(&initial()).await;
        let frame = parse(&obs.rx.recv().await.unwrap());
        assert_eq!(frame["type"], "state");
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_task_ticks_on_interval() {
        let hub = Hub::new(8, TagField::Kind);
        let mut obs = hub.register(&initial()).await;
        obs.rx.recv().await.unwrap();

        let handle = hub.spawn_heartbeat(Duration::from_secs(15));
        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(obs.rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let frame = parse(&obs.rx.recv().await.unwrap());
        assert_eq!(frame["kind"], "heartbeat");
        handle.abort();
    }
}
