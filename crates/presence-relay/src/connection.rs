//! Per-observer connection task.
//!
//! Owns one WebSocket and one hub queue. Frames from the queue are written
//! to the socket with a bounded send; text frames from the socket are fed to
//! the relay as sensor lines. The task ends on the first socket failure, on
//! close, or when the hub drops the observer.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use presence_core::{Observer, PresenceRelay};

/// Handle a single observer WebSocket.
pub async fn handle_observer(
    socket: WebSocket,
    addr: SocketAddr,
    relay: PresenceRelay,
    send_timeout: Duration,
) {
    let (mut sink, mut stream) = socket.split();
    let Observer { id, mut rx } = relay.subscribe().await;

    tracing::info!(peer = %addr, observer = %id, "Observer connected");

    loop {
        tokio::select! {
            // Hub queue -> this observer's socket.
            frame = rx.recv() => {
                let Some(frame) = frame else {
                    tracing::debug!(observer = %id, "Dropped by hub");
                    break;
                };
                match tokio::time::timeout(send_timeout, sink.send(Message::Text(frame.to_string().into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(observer = %id, error = %e, "Send failed");
                        break;
                    }
                    Err(_) => {
                        tracing::debug!(observer = %id, timeout_ms = send_timeout.as_millis() as u64, "Send timed out");
                        break;
                    }
                }
            }

            // Socket -> ingest. Any client may push sensor lines.
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        relay.ingest(text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        relay.ingest(&String::from_utf8_lossy(&data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    relay.hub().unregister(id).await;
    tracing::info!(peer = %addr, observer = %id, "Observer disconnected");
}
