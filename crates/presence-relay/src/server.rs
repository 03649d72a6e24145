//! Router assembly and the `serve` entry point.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use presence_config::schema::ServerConfig;
use presence_config::RelayConfig;
use presence_core::PresenceRelay;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{feed, routes};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub relay: PresenceRelay,
    /// Upper bound on one socket write to an observer.
    pub send_timeout: Duration,
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/api/state", get(routes::state_handler))
        .route("/api/inject", post(routes::inject_handler))
        .route("/api/health", get(routes::health_handler))
        .route(&server.ws_path, get(routes::ws_handler))
        .with_state(state);

    if let Some(dir) = &server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Run the relay until Ctrl-C.
pub async fn serve(config: RelayConfig) -> presence_common::Result<()> {
    let relay = PresenceRelay::from_config(&config);

    let heartbeat = relay
        .hub()
        .spawn_heartbeat(Duration::from_secs(config.broadcast.heartbeat_interval_secs));
    let feed = feed::spawn_feed(&config.feed, relay.clone());

    let state = AppState {
        relay,
        send_timeout: Duration::from_millis(config.broadcast.send_timeout_ms),
    };
    let app = router(state, &config.server);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        ws_path = %config.server.ws_path,
        "presence-relay listening on {}",
        addr
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    heartbeat.abort();
    if let Some(feed) = feed {
        feed.abort();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
