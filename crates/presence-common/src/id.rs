use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static OBSERVER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle identifying one connected observer for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Allocate the next id. Ids are never reused.
    pub fn next() -> Self {
        Self(OBSERVER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs-{}", self.0)
    }
}
