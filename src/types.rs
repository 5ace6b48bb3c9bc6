//! Core types for tunedrop

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a queued job
///
/// Strictly increasing, assigned at enqueue time. Used for observability
/// only — queue order is arrival order, never id order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque identity of a submitter, used to route result notifications
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequesterId(pub u64);

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequesterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identity of a chat room / text channel
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single chat message (auto-expiry target)
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One requested conversion. Immutable once constructed; owned by the
/// queue until dequeued, by the worker while executing, then discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    /// Sequence id assigned at enqueue time
    pub id: JobId,
    /// Who asked for this conversion
    pub requester: RequesterId,
    /// Source locator (URL); opaque to the queue
    pub source: String,
    /// Optional output-name override; when absent the converter derives
    /// a name from the fetched content's metadata
    pub name_override: Option<String>,
}

/// A produced conversion artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Path to the produced file (inside the job's temp directory)
    pub path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
    /// Suggested delivery filename
    pub filename: String,
}

/// Snapshot of queue occupancy for status reporting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs currently executing (0 or 1)
    pub running: usize,
    /// Jobs waiting in the queue
    pub waiting: usize,
}

/// Event emitted during a job's lifecycle
///
/// Observability channel for embedders (logging, dashboards); the
/// requester-facing path is the [`Notifier`](crate::notifier::Notifier).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted into the queue
    Queued {
        /// Job ID
        id: JobId,
        /// 1-based overall position reported to the submitter
        position: usize,
    },

    /// Job dequeued, conversion starting
    Started {
        /// Job ID
        id: JobId,
    },

    /// Artifact produced and handed to the notifier
    Delivered {
        /// Job ID
        id: JobId,
        /// Artifact size in bytes
        size_bytes: u64,
    },

    /// Conversion failed
    Failed {
        /// Job ID
        id: JobId,
        /// Failure detail forwarded to the requester
        error: String,
    },

    /// Artifact produced but too large to deliver
    Oversize {
        /// Job ID
        id: JobId,
        /// Artifact size in bytes
        size_bytes: u64,
    },

    /// Job canceled by an operator
    Canceled {
        /// Job ID
        id: JobId,
    },

    /// Waiting queue drained by an operator
    Drained {
        /// Number of jobs evicted
        evicted: usize,
    },
}
