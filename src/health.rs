//! Keep-alive HTTP endpoint
//!
//! Hosting platforms that sleep idle services probe this tiny server to
//! keep the bot awake. It also exposes a queue-stats snapshot for casual
//! monitoring; anything richer belongs in the event stream.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::HealthConfig;
use crate::error::{Error, Result};
use crate::queue::QueueController;
use crate::types::QueueStats;

/// Create the keep-alive router
///
/// - `GET /` - liveness text
/// - `GET /status` - JSON queue occupancy snapshot
pub fn create_router(controller: QueueController) -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/status", get(status))
        .with_state(controller)
        .layer(TraceLayer::new_for_http())
}

async fn alive() -> &'static str {
    "tunedrop is alive"
}

async fn status(State(controller): State<QueueController>) -> Json<QueueStats> {
    Json(controller.stats().await)
}

/// Run the keep-alive server until it fails or the process exits
pub async fn start_health_server(
    controller: QueueController,
    config: Arc<HealthConfig>,
) -> Result<()> {
    let app = create_router(controller);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(Error::Io)?;

    tracing::info!(address = %config.bind_addr, "keep-alive server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::HealthServer(e.to_string()))
}

/// Spawn the keep-alive server as a background task, honoring the
/// `enabled` flag. Returns the task handle when a server was started.
pub fn spawn_health_server(
    controller: QueueController,
    config: HealthConfig,
) -> Option<tokio::task::JoinHandle<()>> {
    if !config.enabled {
        tracing::debug!("keep-alive server disabled");
        return None;
    }

    let config = Arc::new(config);
    Some(tokio::spawn(async move {
        if let Err(e) = start_health_server(controller, config).await {
            tracing::error!(error = %e, "keep-alive server exited");
        }
    }))
}
