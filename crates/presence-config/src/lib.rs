//! presence-relay configuration system.
//!
//! Provides TOML-based configuration with full validation. All config
//! sections use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use presence_config::{config_to_toml, load_config};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_toml(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::RelayConfig;

use presence_common::ConfigError;
use std::path::Path;

/// Load config from `path`, or from the platform default path when `None`.
///
/// An explicit path must exist. The default path is created with a
/// documented template on first run. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a TOML string.
pub fn config_to_toml(config: &RelayConfig) -> String {
    toml::to_string_pretty(config)
        .unwrap_or_else(|e| format!("# failed to serialize config: {e}\n"))
}
