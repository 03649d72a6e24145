//! Where the config file lives, and writing the first one.

use presence_common::ConfigError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "presence-relay";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/presence-relay/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| config_path_under(&base))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

fn config_path_under(base: &Path) -> PathBuf {
    base.join(APP_DIR).join(FILE_NAME)
}

/// Write the commented template to `path`. An existing file is left alone.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| {
        ConfigError::ParseError(format!("failed to write default config to {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut file = match std::fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(write_err(e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(write_err)?;

    info!(path = %path.display(), "Created default config");
    Ok(())
}
