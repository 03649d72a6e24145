//! Sensor line feed configuration.

use serde::{Deserialize, Serialize};

/// Which local line source feeds the relay, besides network clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeedSource {
    /// Only network clients and manual injection feed the relay.
    #[default]
    None,
    /// Newline-delimited text from a serial device.
    Serial,
    /// Newline-delimited text from standard input.
    Stdin,
    /// Text frames from a sensor's own WebSocket server (e.g. an ESP32 on
    /// port 81), dialled out to at `url`.
    WebSocket,
}

/// Feed settings. Only the fields of the selected source are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source: FeedSource,
    /// Device path, e.g. `/dev/ttyUSB0`, `/dev/ttyAMA0` or `COM3`.
    pub device: String,
    pub baud_rate: u32,
    /// Sensor WebSocket URL for `source = "websocket"`.
    pub url: String,
    /// Delay before redialling a dropped sensor WebSocket. 0 disables.
    pub reconnect_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: FeedSource::None,
            device: "/dev/ttyUSB0".into(),
            baud_rate: 115_200,
            url: "ws://192.168.4.1:81".into(),
            reconnect_delay_secs: 5,
        }
    }
}

/// Baud rates the serial feed accepts.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800, 921_600,
];
