//! # tunedrop
//!
//! Backend library for a chat-platform media download bot: user-submitted
//! URLs go through a single-worker FIFO job queue, an external converter
//! turns each one into an audio file, and the result is delivered back to
//! the requester.
//!
//! ## Design Philosophy
//!
//! tunedrop is designed to be:
//! - **Strictly serial** - One conversion at a time, arrival order, no surprises
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Never silent** - Every job ends in exactly one terminal notification
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tunedrop::{Config, QueueController, RequesterId, WebhookNotifier, YtDlpConverter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!
//!     let converter = Arc::new(YtDlpConverter::from_config(&config.tools, &config.download)?);
//!     let webhook = config
//!         .notifications
//!         .webhook
//!         .clone()
//!         .ok_or("webhook not configured")?;
//!     let notifier = Arc::new(WebhookNotifier::new(webhook));
//!
//!     let controller = QueueController::new(config.clone(), converter, notifier);
//!     let worker = controller.start_worker();
//!
//!     // Subscribe to events
//!     let mut events = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let (id, position) = controller
//!         .submit(RequesterId(42), "https://example.com/watch?v=abc", None)
//!         .await;
//!     println!("job {id} queued at position {position}");
//!
//!     tunedrop::run_with_shutdown(controller, worker).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Caller authorization (owners, admins)
pub mod auth;
/// Configuration types
pub mod config;
/// Converter trait and yt-dlp implementation
pub mod converter;
/// Error types
pub mod error;
/// Automatic message expiry
pub mod expiry;
/// Keep-alive HTTP endpoint
pub mod health;
/// Requester notifications
pub mod notifier;
/// Job queue and worker lifecycle (decomposed into focused submodules)
pub mod queue;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthRegistry, Role};
pub use config::{
    AuthConfig, ChannelsConfig, Config, DownloadConfig, HealthConfig, NotificationConfig,
    ToolsConfig, WebhookConfig,
};
pub use converter::{Converter, YtDlpConverter};
pub use error::{Error, Result};
pub use expiry::{MessageExpiry, MessageSink};
pub use notifier::{NotificationPayload, Notifier, WebhookNotifier};
pub use queue::QueueController;
pub use types::{Artifact, ChannelId, Event, Job, JobId, MessageId, QueueStats, RequesterId};

/// Helper function to run the queue with graceful signal handling.
///
/// Waits for a termination signal, drains the queue so every pending and
/// in-flight job gets its canceled notification, then stops the worker.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(
    controller: QueueController,
    worker: tokio::task::JoinHandle<()>,
) {
    wait_for_signal().await;
    let evicted = controller.cancel_all().await;
    tracing::info!(evicted, "shutting down");
    worker.abort();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT (Ctrl+C)"),
            }
        }
        _ => {
            tracing::warn!("could not register unix signal handlers, falling back to ctrl_c");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    } else {
        tracing::info!("received Ctrl+C");
    }
}
