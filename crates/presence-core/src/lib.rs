//! Presence-state engine: classify sensor lines, keep one authoritative
//! occupancy state, and fan it out to connected observers.

pub mod classifier;
pub mod hub;
pub mod ingest;
pub mod protocol;
pub mod relay;
pub mod state;

pub use classifier::{Classifier, Evidence, Matcher};
pub use hub::{Frame, Hub, Observer};
pub use ingest::{unwrap_payload, IngestEvent};
pub use protocol::{BroadcastEvent, IngestMessage, PresenceSnapshot};
pub use relay::{IngestOutcome, PresenceRelay};
pub use state::{PresenceState, StateStore, UpdateResult};
