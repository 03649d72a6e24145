//! Configuration schema types for the presence relay.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod broadcast;
mod classifier;
mod feed;
mod logging;
mod server;

pub use broadcast::*;
pub use classifier::*;
pub use feed::*;
pub use logging::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub classifier: ClassifierConfig,
    pub broadcast: BroadcastConfig,
    pub logging: LoggingConfig,
}
