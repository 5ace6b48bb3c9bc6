//! Configuration types for tunedrop

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, net::SocketAddr, path::PathBuf, time::Duration};

use crate::types::ChannelId;

/// Delivery ceiling matching the chat platform's message-attachment limit
const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 30 * 1024 * 1024;

/// Download and conversion behavior (directories, size ceiling, audio settings)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Temporary directory for per-job work dirs (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum artifact size deliverable to a requester, in bytes
    /// (default: 30 MiB)
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,

    /// Target audio format passed to the converter (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality passed to the converter (default: "192K")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            max_artifact_bytes: default_max_artifact_bytes(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
        }
    }
}

/// External tool paths (yt-dlp, ffmpeg)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected by yt-dlp if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths
    /// not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Bot owner / admin identities
///
/// Owners hold every privilege; admins may use operator commands such as
/// cancel-all. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Primary owners of the bot (user ids)
    #[serde(default)]
    pub owner_ids: HashSet<u64>,

    /// Admins of the bot (user ids)
    #[serde(default)]
    pub admin_ids: HashSet<u64>,
}

/// Room scoping for submissions and auto-expiry
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Channels where the download command is allowed.
    /// An empty set means every channel is allowed.
    #[serde(default)]
    pub allowed_channel_ids: HashSet<u64>,

    /// Channels where automatic message expiry is active
    #[serde(default)]
    pub expiry_channel_ids: HashSet<u64>,

    /// Default delay before an observed message expires, in seconds
    /// (default: 10)
    #[serde(default = "default_expiry_delay_secs")]
    pub expiry_delay_secs: u64,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            allowed_channel_ids: HashSet::new(),
            expiry_channel_ids: HashSet::new(),
            expiry_delay_secs: default_expiry_delay_secs(),
        }
    }
}

impl ChannelsConfig {
    /// Whether the download command may be used in the given channel
    pub fn is_channel_allowed(&self, channel: ChannelId) -> bool {
        self.allowed_channel_ids.is_empty() || self.allowed_channel_ids.contains(&channel.0)
    }

    /// Default expiry delay as a Duration
    pub fn expiry_delay(&self) -> Duration {
        Duration::from_secs(self.expiry_delay_secs)
    }
}

/// Outbound webhook configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL
    pub url: String,

    /// Request timeout (default: 10 s)
    #[serde(default = "default_webhook_timeout")]
    pub timeout: Duration,

    /// Optional value for the Authorization header
    #[serde(default)]
    pub auth_header: Option<String>,
}

/// Notification configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook the shipped [`WebhookNotifier`](crate::notifier::WebhookNotifier)
    /// posts job outcomes to (None = notifier constructed manually)
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Keep-alive HTTP endpoint configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Whether the keep-alive server runs at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address (default: 0.0.0.0:10000)
    #[serde(default = "default_health_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: default_health_bind_addr(),
        }
    }
}

/// Main configuration for tunedrop
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — temp dir, size ceiling, audio settings
/// - [`tools`](ToolsConfig) — external binary paths
/// - [`auth`](AuthConfig) — owner and admin ids
/// - [`channels`](ChannelsConfig) — room scoping, expiry delay
/// - [`notifications`](NotificationConfig) — webhook delivery
/// - [`health`](HealthConfig) — keep-alive endpoint
///
/// All sub-config fields are flattened so the JSON/TOML format stays flat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download and conversion behavior
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Owner and admin identities
    #[serde(flatten)]
    pub auth: AuthConfig,

    /// Room scoping for submissions and auto-expiry
    #[serde(flatten)]
    pub channels: ChannelsConfig,

    /// Notification settings
    #[serde(flatten)]
    pub notifications: NotificationConfig,

    /// Keep-alive endpoint settings
    #[serde(flatten)]
    pub health: HealthConfig,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_ARTIFACT_BYTES
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_expiry_delay_secs() -> u64 {
    10
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_health_bind_addr() -> SocketAddr {
    // keep-alive convention: hosting platforms probe this port
    "0.0.0.0:10000".parse().unwrap_or_else(|_| {
        SocketAddr::from(([0, 0, 0, 0], 10000))
    })
}

fn default_true() -> bool {
    true
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_values() {
        let config = Config::default();
        assert_eq!(config.download.temp_dir, PathBuf::from("./temp"));
        assert_eq!(config.download.max_artifact_bytes, 30 * 1024 * 1024);
        assert_eq!(config.download.audio_format, "mp3");
        assert_eq!(config.download.audio_quality, "192K");
        assert_eq!(config.channels.expiry_delay_secs, 10);
        assert!(config.tools.search_path);
        assert!(config.health.enabled);
        assert_eq!(config.health.bind_addr.port(), 10000);
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.download.max_artifact_bytes, 30 * 1024 * 1024);
        assert!(config.auth.owner_ids.is_empty());
        assert!(config.notifications.webhook.is_none());
    }

    #[test]
    fn flattened_fields_parse_from_flat_json() {
        let config: Config = serde_json::from_str(
            r#"{
                "temp_dir": "/var/tmp/tunedrop",
                "max_artifact_bytes": 8388608,
                "owner_ids": [1147798918973898762],
                "allowed_channel_ids": [1440191545251860594],
                "expiry_delay_secs": 30
            }"#,
        )
        .unwrap();

        assert_eq!(config.download.temp_dir, PathBuf::from("/var/tmp/tunedrop"));
        assert_eq!(config.download.max_artifact_bytes, 8 * 1024 * 1024);
        assert!(config.auth.owner_ids.contains(&1147798918973898762));
        assert_eq!(config.channels.expiry_delay_secs, 30);
    }

    #[test]
    fn empty_allowed_set_permits_every_channel() {
        let channels = ChannelsConfig::default();
        assert!(channels.is_channel_allowed(ChannelId(1)));
        assert!(channels.is_channel_allowed(ChannelId(u64::MAX)));
    }

    #[test]
    fn nonempty_allowed_set_gates_channels() {
        let channels = ChannelsConfig {
            allowed_channel_ids: HashSet::from([10, 20]),
            ..Default::default()
        };
        assert!(channels.is_channel_allowed(ChannelId(10)));
        assert!(!channels.is_channel_allowed(ChannelId(30)));
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = Config::default();
        config.auth.owner_ids.insert(42);
        config.notifications.webhook = Some(WebhookConfig {
            url: "https://hooks.example.com/jobs".into(),
            timeout: Duration::from_secs(5),
            auth_header: Some("Bearer token".into()),
        });

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();

        assert!(back.auth.owner_ids.contains(&42));
        let webhook = back.notifications.webhook.unwrap();
        assert_eq!(webhook.url, "https://hooks.example.com/jobs");
        assert_eq!(webhook.timeout, Duration::from_secs(5));
    }
}
