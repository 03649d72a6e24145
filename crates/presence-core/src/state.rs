//! The single authoritative presence state and its only mutator.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::classifier::Classifier;
use crate::protocol::{iso_timestamp, PresenceSnapshot};

/// Outcome of feeding one line to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    Unchanged,
    Transitioned { presence: bool, at: DateTime<Utc> },
}

impl UpdateResult {
    pub fn is_transition(&self) -> bool {
        matches!(self, UpdateResult::Transitioned { .. })
    }
}

/// `last_update` is `Some` iff at least one transition has happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceState {
    pub presence: bool,
    pub last_raw: String,
    pub last_update: Option<DateTime<Utc>>,
}

impl PresenceState {
    /// Classify `raw` and record it. Blank input leaves every field untouched.
    ///
    /// Transition timestamps strictly increase even if the clock does not.
    pub fn apply(&mut self, raw: &str, classifier: &Classifier, now: DateTime<Utc>) -> UpdateResult {
        let line = raw.trim();
        if line.is_empty() {
            return UpdateResult::Unchanged;
        }

        self.last_raw = line.to_string();
        let presence = classifier.classify(line);
        if presence == self.presence {
            return UpdateResult::Unchanged;
        }

        let at = match self.last_update {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        self.presence = presence;
        self.last_update = Some(at);
        UpdateResult::Transitioned { presence, at }
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            presence: self.presence,
            last_raw: self.last_raw.clone(),
            last_update: self.last_update.as_ref().map(iso_timestamp),
        }
    }
}

/// Shared, lock-guarded presence state plus the classifier that drives it.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<Mutex<PresenceState>>,
    classifier: Arc<Classifier>,
}

impl StateStore {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(PresenceState::default())),
            classifier: Arc::new(classifier),
        }
    }

    /// Classify and record one line. This is the only way the shared state
    /// changes. The guard is handed back so the caller can fan out the
    /// result before any other update lands.
    pub(crate) async fn update(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> (UpdateResult, MutexGuard<'_, PresenceState>) {
        let mut state = self.state.lock().await;
        let result = state.apply(raw, &self.classifier, now);
        (result, state)
    }

    pub async fn snapshot(&self) -> PresenceSnapshot {
        self.state.lock().await.snapshot()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Hold the state without changing it (snapshot + observer registration).
    pub(crate) async fn lock(&self) -> MutexGuard<'_, PresenceState> {
        self.state.lock().await
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Classifier::full())
    }
}
