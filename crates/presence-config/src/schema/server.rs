//! HTTP / WebSocket listener configuration.

use serde::{Deserialize, Serialize};

/// Where the relay listens and what it serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface address to bind.
    pub bind: String,
    /// TCP port (valid range: 1-65535).
    pub port: u16,
    /// Path observers and network feeds connect to.
    pub ws_path: String,
    /// Directory of dashboard assets served as the router fallback.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8085,
            ws_path: "/ws".into(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
