//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod broadcast;
mod classifier;
mod feed;
mod helpers;
mod server;


use crate::schema::RelayConfig;
use presence_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RelayConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    server::validate_server(&mut errors, config);
    feed::validate_feed(&mut errors, config);
    classifier::validate_classifier(&mut errors, config);
    broadcast::validate_broadcast(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
