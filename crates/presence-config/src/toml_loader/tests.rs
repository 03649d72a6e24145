//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use crate::schema::{ClassifierPreset, ClassifierRule, FeedSource, TagField};
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_presence_relay_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, presence_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 3000

[feed]
source = "serial"
device = "/dev/ttyAMA0"

[broadcast]
tag_field = "type"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.feed.source, FeedSource::Serial);
    assert_eq!(config.feed.device, "/dev/ttyAMA0");
    assert_eq!(config.broadcast.tag_field, TagField::Type);
    // Defaults preserved
    assert_eq!(config.server.ws_path, "/ws");
    assert_eq!(config.feed.baud_rate, 115_200);
    assert_eq!(config.broadcast.heartbeat_interval_secs, 15);
}

#[test]
fn load_websocket_feed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[feed]
source = "websocket"
url = "ws://10.0.0.7:81"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.feed.source, FeedSource::WebSocket);
    assert_eq!(config.feed.url, "ws://10.0.0.7:81");
    assert_eq!(config.feed.reconnect_delay_secs, 5);
}

#[test]
fn load_classifier_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[classifier]
preset = "keyword"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.classifier.preset, ClassifierPreset::Keyword);
    assert_eq!(config.classifier.effective_rules(), vec![ClassifierRule::Keyword]);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, presence_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[broadcast]
heartbeat_interval_secs = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.broadcast.heartbeat_interval_secs, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presence-relay").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 8085);
    assert_eq!(config.feed.source, FeedSource::None);
}

#[test]
fn default_config_toml_is_valid() {
    use crate::schema::RelayConfig;

    let content = default_config_toml();
    let config: RelayConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.server.port, 8085);
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_is_reasonable() {
    // May not resolve in every CI environment.
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("presence-relay"));
        assert!(path_str.ends_with("config.toml"));
    }
}
