//! `presence-relay replay`: push a captured sensor log at a running relay.
//!
//! Each non-blank line of the file is wrapped as `{"sensorId", "raw"}` and
//! sent as one WebSocket text frame, one per interval. Frames the relay
//! sends back are drained and discarded.

use std::path::PathBuf;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use presence_common::RelayError;
use presence_core::IngestMessage;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub url: String,
    pub file: PathBuf,
    pub sensor_id: String,
    pub interval: Duration,
}

/// Read the replay file, dropping blank lines.
pub fn load_lines(path: &std::path::Path) -> Result<Vec<String>, RelayError> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Wrap each line in the sensor client envelope.
pub fn frames(lines: &[String], sensor_id: &str) -> Result<Vec<String>, RelayError> {
    lines
        .iter()
        .map(|line| {
            let msg = IngestMessage {
                sensor_id: Some(sensor_id.to_string()),
                raw: line.clone(),
            };
            serde_json::to_string(&msg).map_err(|e| RelayError::Other(e.to_string()))
        })
        .collect()
}

/// Replay the file. Returns the number of frames sent.
pub async fn run(opts: ReplayOptions) -> Result<usize, RelayError> {
    let lines = load_lines(&opts.file)?;
    if lines.is_empty() {
        warn!(file = %opts.file.display(), "Nothing to replay");
        return Ok(0);
    }
    let frames = frames(&lines, &opts.sensor_id)?;

    info!(url = %opts.url, lines = frames.len(), "Connecting to relay");
    let (ws, _) = tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(&opts.url))
        .await
        .map_err(|_| RelayError::Network(format!("connection to {} timed out after 15s", opts.url)))?
        .map_err(|e| RelayError::Network(e.to_string()))?;

    let (mut write, mut read) = ws.split();
    let drain = tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(WsMessage::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let mut sent = 0;
    for (i, frame) in frames.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(opts.interval).await;
        }
        write
            .send(WsMessage::Text(frame.into()))
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;
        sent += 1;
        info!(line = i + 1, "Sent");
    }

    let _ = write.send(WsMessage::Close(None)).await;
    drain.abort();
    info!(sent, "Replay finished");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{router, AppState};
    use presence_config::RelayConfig;
    use presence_core::PresenceRelay;
    use std::net::SocketAddr;

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.log");
        std::fs::write(&path, "targets=0\n\n   \ntargets=2\r\nperson\n").unwrap();

        let lines = load_lines(&path).unwrap();
        assert_eq!(lines, vec!["targets=0", "targets=2", "person"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_lines(std::path::Path::new("/nonexistent/capture.log")).unwrap_err();
        assert!(matches!(err, RelayError::Io(_)));
    }

    #[test]
    fn frames_carry_sensor_id_and_raw() {
        let frames = frames(&["targets=1".to_string()], "sensor1").unwrap();
        let json: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(json["sensorId"], "sensor1");
        assert_eq!(json["raw"], "targets=1");
    }

    #[tokio::test]
    async fn replay_drives_a_live_relay() {
        let config = RelayConfig::default();
        let relay = PresenceRelay::from_config(&config);
        let app = router(
            AppState {
                relay: relay.clone(),
                send_timeout: Duration::from_secs(2),
            },
            &config.server,
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("capture.log");
        std::fs::write(&file, "targets=0\n\ntargets=4\n").unwrap();

        let sent = run(ReplayOptions {
            url: format!("ws://{addr}/ws"),
            file,
            sensor_id: "replay".into(),
            interval: Duration::from_millis(10),
        })
        .await
        .unwrap();
        assert_eq!(sent, 2);

        for _ in 0..100 {
            if relay.snapshot().await.last_raw == "targets=4" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let snapshot = relay.snapshot().await;
        assert!(snapshot.presence);
        assert_eq!(snapshot.last_raw, "targets=4");
    }

    #[tokio::test]
    async fn unreachable_relay_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("capture.log");
        std::fs::write(&file, "targets=1\n").unwrap();

        let err = run(ReplayOptions {
            url: "ws://127.0.0.1:1/ws".into(),
            file,
            sensor_id: "replay".into(),
            interval: Duration::from_millis(10),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RelayError::Network(_)));
    }
}
