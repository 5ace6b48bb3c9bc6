//! Error types for tunedrop
//!
//! One variant per failure class the queue and its collaborators can
//! produce. Everything that happens inside a single job's processing is
//! recovered by the worker loop; nothing here terminates it.

use thiserror::Error;

/// Result type alias for tunedrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tunedrop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// Converter-reported failure (network, not-found, format). Terminal
    /// for the job it belongs to; the worker reports it and moves on.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// Artifact produced but exceeds the delivery size ceiling
    #[error("artifact is {size_bytes} bytes, exceeds the {limit_bytes} byte delivery limit")]
    Oversize {
        /// Size of the produced artifact in bytes
        size_bytes: u64,
        /// Configured delivery ceiling in bytes
        limit_bytes: u64,
    },

    /// Operator-initiated interruption of the in-flight job. Not a fault.
    #[error("canceled by operator")]
    Canceled,

    /// Notifier could not reach the requester. Logged, never retried,
    /// never blocks queue progression.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Caller lacks the role an operator command requires
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Required external binary missing (yt-dlp, ffmpeg)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Keep-alive server error
    #[error("health server error: {0}")]
    HealthServer(String),
}

impl Error {
    /// True for the operator-cancellation signal, which the worker reports
    /// with distinct wording from a conversion failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}
