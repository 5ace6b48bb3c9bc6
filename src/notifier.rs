//! Notifier trait and webhook-backed implementation
//!
//! The notifier is the queue's only way to talk to a requester. Delivery
//! is fire-and-forget from the worker's perspective: a failed
//! notification is logged by the caller and never blocks queue progress.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WebhookConfig;
use crate::error::{Error, Result};
use crate::types::{JobId, RequesterId};

/// Messaging a requester about their job
///
/// Exactly one of `delivered` / `failed` / `oversize` / `canceled` is
/// called per job — the terminal notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Acknowledge enqueue with the computed 1-based overall position
    async fn queued(&self, requester: RequesterId, id: JobId, position: usize) -> Result<()>;

    /// Tell the requester their job started executing
    async fn processing(&self, requester: RequesterId, id: JobId) -> Result<()>;

    /// Deliver the produced artifact
    async fn delivered(
        &self,
        requester: RequesterId,
        id: JobId,
        artifact: &Path,
        filename: &str,
    ) -> Result<()>;

    /// Report a conversion failure with the converter's own error text
    async fn failed(&self, requester: RequesterId, id: JobId, reason: &str) -> Result<()>;

    /// Report an artifact that exceeded the delivery ceiling
    async fn oversize(
        &self,
        requester: RequesterId,
        id: JobId,
        size_bytes: u64,
        limit_bytes: u64,
    ) -> Result<()>;

    /// Report an operator cancellation (distinct wording from a failure)
    async fn canceled(&self, requester: RequesterId, id: JobId) -> Result<()>;
}

/// JSON payload posted for each notification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Notification kind: "queued", "processing", "delivered", "failed",
    /// "oversize", or "canceled"
    pub event: String,
    /// Job ID
    pub job_id: JobId,
    /// Requester the message is addressed to
    pub requester: RequesterId,
    /// 1-based queue position (queued only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Delivery filename (delivered only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Artifact path on the host (delivered only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Failure or oversize detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Unix timestamp of the notification
    pub timestamp: i64,
}

impl NotificationPayload {
    fn new(event: &str, requester: RequesterId, id: JobId) -> Self {
        Self {
            event: event.to_string(),
            job_id: id,
            requester,
            position: None,
            filename: None,
            artifact: None,
            detail: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Notifier posting each notification to a configured webhook
///
/// A chat-platform gateway on the other end turns payloads into direct
/// messages and file uploads.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier for the given webhook
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, payload: NotificationPayload) -> Result<()> {
        let mut request = self
            .client
            .post(&self.config.url)
            .json(&payload)
            .timeout(self.config.timeout);

        if let Some(ref auth) = self.config.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(
            event = %payload.event,
            job_id = payload.job_id.0,
            "notification sent"
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn queued(&self, requester: RequesterId, id: JobId, position: usize) -> Result<()> {
        let mut payload = NotificationPayload::new("queued", requester, id);
        payload.position = Some(position);
        self.post(payload).await
    }

    async fn processing(&self, requester: RequesterId, id: JobId) -> Result<()> {
        self.post(NotificationPayload::new("processing", requester, id))
            .await
    }

    async fn delivered(
        &self,
        requester: RequesterId,
        id: JobId,
        artifact: &Path,
        filename: &str,
    ) -> Result<()> {
        let mut payload = NotificationPayload::new("delivered", requester, id);
        payload.filename = Some(filename.to_string());
        payload.artifact = Some(artifact.display().to_string());
        self.post(payload).await
    }

    async fn failed(&self, requester: RequesterId, id: JobId, reason: &str) -> Result<()> {
        let mut payload = NotificationPayload::new("failed", requester, id);
        payload.detail = Some(reason.to_string());
        self.post(payload).await
    }

    async fn oversize(
        &self,
        requester: RequesterId,
        id: JobId,
        size_bytes: u64,
        limit_bytes: u64,
    ) -> Result<()> {
        let mut payload = NotificationPayload::new("oversize", requester, id);
        payload.detail = Some(format!(
            "artifact is {} bytes, exceeds the {} byte limit",
            size_bytes, limit_bytes
        ));
        self.post(payload).await
    }

    async fn canceled(&self, requester: RequesterId, id: JobId) -> Result<()> {
        let mut payload = NotificationPayload::new("canceled", requester, id);
        payload.detail = Some("canceled by operator".to_string());
        self.post(payload).await
    }
}
