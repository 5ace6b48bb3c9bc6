//! Automatic message expiry for configured channels.
//!
//! Messages observed in an expiry channel are deleted after a fixed delay.
//! Deletion is fire-and-forget: a failed delete is a logged warning and
//! nothing more.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ChannelsConfig;
use crate::error::Result;
use crate::types::{ChannelId, MessageId};

/// Deleting a single chat message, implemented by the platform gateway
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Delete one message from one channel
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;
}

/// Watches configured channels and expires their messages after a delay
pub struct MessageExpiry {
    channels: ChannelsConfig,
    sink: Arc<dyn MessageSink>,
}

impl MessageExpiry {
    /// Create an expiry watcher over the given sink
    pub fn new(channels: ChannelsConfig, sink: Arc<dyn MessageSink>) -> Self {
        Self { channels, sink }
    }

    /// Whether messages in the given channel expire at all
    pub fn is_expiry_channel(&self, channel: ChannelId) -> bool {
        self.channels.expiry_channel_ids.contains(&channel.0)
    }

    /// Note a freshly posted message; schedules its deletion if the
    /// channel is configured for expiry. Returns whether a deletion was
    /// scheduled.
    pub fn observe(&self, channel: ChannelId, message: MessageId) -> bool {
        if !self.is_expiry_channel(channel) {
            return false;
        }
        self.schedule(channel, message, self.channels.expiry_delay());
        true
    }

    /// Schedule deletion of one message after `delay`, regardless of
    /// channel configuration
    pub fn schedule(&self, channel: ChannelId, message: MessageId, delay: Duration) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sink.delete_message(channel, message).await {
                tracing::warn!(
                    channel = channel.0,
                    message = message.0,
                    error = %e,
                    "failed to expire message"
                );
            } else {
                tracing::debug!(channel = channel.0, message = message.0, "message expired");
            }
        });
    }
}
