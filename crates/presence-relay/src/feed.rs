//! Local feeds: a serial device, standard input, or a sensor's own
//! WebSocket server.
//!
//! Lines are read as bytes and decoded lossily, so sensor noise never kills
//! the feed. A feed that cannot start logs a diagnostic and exits; the HTTP
//! and WebSocket side keeps running with whatever state it has.

use std::time::Duration;

use futures_util::StreamExt;
use presence_common::IngestError;
use presence_config::schema::{FeedConfig, FeedSource};
use presence_core::PresenceRelay;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Longest line kept; the rest of an over-long line is discarded.
pub const MAX_LINE_BYTES: usize = 4096;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Start the configured feed, if any.
pub fn spawn_feed(config: &FeedConfig, relay: PresenceRelay) -> Option<JoinHandle<()>> {
    if config.source == FeedSource::None {
        tracing::info!("No local feed configured; waiting for network clients");
        return None;
    }

    let config = config.clone();
    Some(tokio::spawn(async move {
        loop {
            match run_feed(&config, &relay).await {
                Ok(lines) => {
                    tracing::warn!(source = ?config.source, lines, "Feed ended");
                }
                Err(e @ IngestError::FeedOpen { .. }) => {
                    tracing::error!(error = %e, "Feed could not start");
                    for hint in troubleshooting_hints(&config) {
                        tracing::error!("  {hint}");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Feed stopped");
                }
            }

            // Only the sensor WebSocket is redialled.
            if config.source != FeedSource::WebSocket || config.reconnect_delay_secs == 0 {
                break;
            }
            tracing::info!(delay_secs = config.reconnect_delay_secs, url = %config.url, "Reconnecting to sensor");
            tokio::time::sleep(Duration::from_secs(config.reconnect_delay_secs)).await;
        }
    }))
}

/// Run one session of the feed to completion. Returns the number of lines
/// (or frames) read.
pub async fn run_feed(config: &FeedConfig, relay: &PresenceRelay) -> Result<u64, IngestError> {
    match config.source {
        FeedSource::None => Ok(0),
        FeedSource::Stdin => {
            tracing::info!("Reading sensor lines from stdin");
            pump_lines(BufReader::new(tokio::io::stdin()), relay).await
        }
        FeedSource::Serial => {
            let port = tokio_serial::new(config.device.as_str(), config.baud_rate)
                .open_native_async()
                .map_err(|e| IngestError::FeedOpen {
                    source_name: config.device.clone(),
                    reason: e.to_string(),
                })?;
            tracing::info!(device = %config.device, baud = config.baud_rate, "Serial feed opened");
            pump_lines(BufReader::new(port), relay).await
        }
        FeedSource::WebSocket => pump_websocket(&config.url, relay).await,
    }
}

/// Feed every line from `reader` into the relay until EOF.
pub async fn pump_lines<R>(mut reader: R, relay: &PresenceRelay) -> Result<u64, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0u64;
    loop {
        buf.clear();
        let Some(truncated) = read_capped_line(&mut reader, &mut buf)
            .await
            .map_err(|e| IngestError::FeedRead(e.to_string()))?
        else {
            return Ok(lines);
        };
        lines += 1;
        if truncated {
            tracing::warn!(max = MAX_LINE_BYTES, "Over-long feed line truncated");
        }
        let line = String::from_utf8_lossy(&buf);
        tracing::trace!(line = %line.trim_end(), "Feed line");
        relay.ingest(&line).await;
    }
}

/// Read one `\n`-terminated line into `buf`, keeping at most
/// `MAX_LINE_BYTES`. `None` at EOF; otherwise whether the line was cut.
async fn read_capped_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<bool>>
where
    R: AsyncBufRead + Unpin,
{
    let mut read_any = false;
    let mut truncated = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(read_any.then_some(truncated));
        }
        read_any = true;

        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };
        let room = MAX_LINE_BYTES.saturating_sub(buf.len());
        let keep = used.min(room);
        if keep < used {
            truncated = true;
        }
        buf.extend_from_slice(&available[..keep]);
        reader.consume(used);

        if done {
            return Ok(Some(truncated));
        }
    }
}

/// Dial a sensor's WebSocket server and ingest every frame until it closes.
async fn pump_websocket(url: &str, relay: &PresenceRelay) -> Result<u64, IngestError> {
    let open_err = |reason: String| IngestError::FeedOpen {
        source_name: url.to_string(),
        reason,
    };

    tracing::info!(url, "Connecting to sensor WebSocket");
    let (mut ws, _) = tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(url))
        .await
        .map_err(|_| open_err("connection timed out after 15s".into()))?
        .map_err(|e| open_err(e.to_string()))?;
    tracing::info!(url, "Sensor WebSocket connected");

    let mut frames = 0u64;
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => {
                frames += 1;
                relay.ingest(text.as_str()).await;
            }
            Ok(WsMessage::Binary(data)) => {
                frames += 1;
                relay.ingest(&String::from_utf8_lossy(&data)).await;
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => return Err(IngestError::FeedRead(e.to_string())),
        }
    }
    Ok(frames)
}

fn troubleshooting_hints(config: &FeedConfig) -> Vec<String> {
    match config.source {
        FeedSource::WebSocket => vec![
            "Check the sensor is powered and its WiFi access point is up".to_string(),
            format!(
                "Make sure this machine can reach the sensor and [feed] url is right (currently {})",
                config.url
            ),
            "The sensor firmware serves WebSocket on port 81 by default".to_string(),
        ],
        _ => vec![
            "Check the sensor is connected and powered".to_string(),
            format!(
                "Run `presence-relay ports` and set [feed] device (currently {})",
                config.device
            ),
            "Make sure your user can open the device (dialout group on Linux, drivers on Windows)"
                .to_string(),
            "Make sure no other program (serial monitor, IDE) holds the port".to_string(),
            format!(
                "Check the sensor baud rate matches [feed] baud_rate (currently {})",
                config.baud_rate
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use presence_config::RelayConfig;

    fn relay() -> PresenceRelay {
        PresenceRelay::from_config(&RelayConfig::default())
    }

    #[tokio::test]
    async fn pump_lines_feeds_every_line() {
        let relay = relay();
        let input: &[u8] = b"targets=0\r\ntargets=2\n\n{\"sensorId\":\"s\",\"raw\":\"targets=1\"}\n";
        let lines = pump_lines(input, &relay).await.unwrap();
        assert_eq!(lines, 4);

        let snapshot = relay.snapshot().await;
        assert!(snapshot.presence);
        assert_eq!(snapshot.last_raw, "targets=1");
    }

    #[tokio::test]
    async fn pump_lines_survives_invalid_utf8() {
        let relay = relay();
        let input: &[u8] = b"\xff\xfe garbage\nperson\n";
        pump_lines(input, &relay).await.unwrap();
        assert!(relay.snapshot().await.presence);
    }

    #[tokio::test]
    async fn last_line_without_newline_is_read() {
        let relay = relay();
        let input: &[u8] = b"human";
        assert_eq!(pump_lines(input, &relay).await.unwrap(), 1);
        assert_eq!(relay.snapshot().await.last_raw, "human");
    }

    #[tokio::test]
    async fn over_long_line_is_capped_and_rest_dropped() {
        let mut input = vec![b'x'; MAX_LINE_BYTES * 3];
        input.extend_from_slice(b"person\ntargets=0\n");

        // Small buffer so the line spans many fill_buf calls.
        let mut reader = BufReader::with_capacity(64, input.as_slice());
        let mut buf = Vec::new();
        assert_eq!(read_capped_line(&mut reader, &mut buf).await.unwrap(), Some(true));
        assert_eq!(buf.len(), MAX_LINE_BYTES);
        assert!(buf.iter().all(|&b| b == b'x'));

        buf.clear();
        assert_eq!(read_capped_line(&mut reader, &mut buf).await.unwrap(), Some(false));
        assert_eq!(buf, b"targets=0\n");

        buf.clear();
        assert_eq!(read_capped_line(&mut reader, &mut buf).await.unwrap(), None);
    }

    #[tokio::test]
    async fn over_long_line_does_not_leak_into_state() {
        let relay = relay();
        let mut input = vec![b'0'; MAX_LINE_BYTES + 10];
        input.extend_from_slice(b" person\n");
        assert_eq!(pump_lines(input.as_slice(), &relay).await.unwrap(), 1);

        let snapshot = relay.snapshot().await;
        assert_eq!(snapshot.last_raw.len(), MAX_LINE_BYTES);
        assert!(!snapshot.presence);
    }

    #[tokio::test]
    async fn missing_device_is_a_feed_open_error() {
        let relay = relay();
        let config = FeedConfig {
            source: FeedSource::Serial,
            device: "/dev/presence-relay-does-not-exist".into(),
            ..FeedConfig::default()
        };
        let err = run_feed(&config, &relay).await.unwrap_err();
        assert!(matches!(err, IngestError::FeedOpen { .. }));
        assert!(err.to_string().contains("/dev/presence-relay-does-not-exist"));
    }

    #[tokio::test]
    async fn websocket_feed_ingests_sensor_frames() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sensor = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            for frame in [
                r#"{"presence":false,"distance":0}"#,
                r#"{"presence":true,"motion":true,"distance":120}"#,
            ] {
                ws.send(WsMessage::Text(frame.to_string().into())).await.unwrap();
            }
            ws.close(None).await.unwrap();
        });

        let relay = relay();
        let config = FeedConfig {
            source: FeedSource::WebSocket,
            url: format!("ws://{addr}"),
            ..FeedConfig::default()
        };
        let frames = run_feed(&config, &relay).await.unwrap();
        sensor.await.unwrap();

        assert_eq!(frames, 2);
        let snapshot = relay.snapshot().await;
        assert!(snapshot.presence);
        assert!(snapshot.last_raw.contains("\"distance\":120"));
    }

    #[tokio::test]
    async fn unreachable_sensor_is_a_feed_open_error() {
        let relay = relay();
        let config = FeedConfig {
            source: FeedSource::WebSocket,
            url: "ws://127.0.0.1:1".into(),
            ..FeedConfig::default()
        };
        let err = run_feed(&config, &relay).await.unwrap_err();
        assert!(matches!(err, IngestError::FeedOpen { .. }));
        assert!(err.to_string().contains("ws://127.0.0.1:1"));
    }

    #[tokio::test]
    async fn no_feed_configured() {
        assert!(spawn_feed(&FeedConfig::default(), relay()).is_none());
    }

    #[test]
    fn hints_follow_the_source() {
        let serial = troubleshooting_hints(&FeedConfig::default());
        assert!(serial.iter().any(|h| h.contains("/dev/ttyUSB0")));

        let ws = troubleshooting_hints(&FeedConfig {
            source: FeedSource::WebSocket,
            ..FeedConfig::default()
        });
        assert!(ws.iter().any(|h| h.contains("ws://192.168.4.1:81")));
    }
}
