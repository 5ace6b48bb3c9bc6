//! Shared fakes for queue tests: a scripted converter and a recording
//! notifier, plus a harness wiring them into a controller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::types::{Artifact, JobId, RequesterId};

use super::QueueController;

/// Behavior of the scripted converter for one source locator
#[derive(Clone, Debug)]
pub(crate) enum Script {
    /// Write a small file and report the given size
    Succeed { size_bytes: u64 },
    /// Fail with the given reason
    Fail(&'static str),
    /// Panic mid-conversion
    Panic,
    /// Wait for the cancellation token, then report canceled
    BlockUntilCanceled,
    /// Wait for the harness to call `release()`, then succeed
    BlockUntilReleased,
}

/// Converter whose behavior is scripted per source locator.
/// Unscripted sources succeed with a small artifact.
pub(crate) struct ScriptedConverter {
    scripts: Mutex<HashMap<String, Script>>,
    started: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    release: Notify,
}

impl ScriptedConverter {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            release: Notify::new(),
        }
    }

    pub(crate) fn script(&self, source: &str, script: Script) {
        self.scripts.lock().unwrap().insert(source.to_string(), script);
    }

    /// Sources in the order conversions began
    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Highest number of conversions ever in flight at once
    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Let one `BlockUntilReleased` conversion finish
    pub(crate) fn release(&self) {
        self.release.notify_one();
    }

    async fn run(
        &self,
        script: Script,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Artifact> {
        match script {
            Script::Succeed { size_bytes } => {
                let path = work_dir.join("out.mp3");
                tokio::fs::write(&path, b"scripted audio").await?;
                Ok(Artifact {
                    path,
                    size_bytes,
                    filename: "out.mp3".to_string(),
                })
            }
            Script::Fail(reason) => Err(Error::Conversion(reason.to_string())),
            Script::Panic => panic!("scripted converter panic"),
            Script::BlockUntilCanceled => {
                cancel.cancelled().await;
                Err(Error::Canceled)
            }
            Script::BlockUntilReleased => {
                self.release.notified().await;
                let path = work_dir.join("out.mp3");
                tokio::fs::write(&path, b"scripted audio").await?;
                Ok(Artifact {
                    path,
                    size_bytes: 14,
                    filename: "out.mp3".to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Converter for ScriptedConverter {
    async fn convert(
        &self,
        source: &str,
        _name_override: Option<&str>,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Artifact> {
        self.started.lock().unwrap().push(source.to_string());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(source)
            .cloned()
            .unwrap_or(Script::Succeed { size_bytes: 14 });

        let result = self.run(script, work_dir, cancel).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// One recorded notifier call
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Notification {
    pub(crate) id: JobId,
    pub(crate) requester: RequesterId,
    pub(crate) kind: NotificationKind,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NotificationKind {
    Queued(usize),
    Processing,
    Delivered(String),
    Failed(String),
    Oversize { size_bytes: u64, limit_bytes: u64 },
    Canceled,
}

impl NotificationKind {
    pub(crate) fn is_terminal(&self) -> bool {
        !matches!(self, NotificationKind::Queued(_) | NotificationKind::Processing)
    }
}

/// Notifier that records every call for assertions
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn record(&self, id: JobId, requester: RequesterId, kind: NotificationKind) {
        self.sent.lock().unwrap().push(Notification { id, requester, kind });
    }

    pub(crate) fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Terminal notifications recorded for one job
    pub(crate) fn terminals_for(&self, id: JobId) -> Vec<NotificationKind> {
        self.all()
            .into_iter()
            .filter(|n| n.id == id && n.kind.is_terminal())
            .map(|n| n.kind)
            .collect()
    }

    pub(crate) fn has_terminal(&self, id: JobId) -> bool {
        !self.terminals_for(id).is_empty()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn queued(&self, requester: RequesterId, id: JobId, position: usize) -> Result<()> {
        self.record(id, requester, NotificationKind::Queued(position));
        Ok(())
    }

    async fn processing(&self, requester: RequesterId, id: JobId) -> Result<()> {
        self.record(id, requester, NotificationKind::Processing);
        Ok(())
    }

    async fn delivered(
        &self,
        requester: RequesterId,
        id: JobId,
        _artifact: &Path,
        filename: &str,
    ) -> Result<()> {
        self.record(id, requester, NotificationKind::Delivered(filename.to_string()));
        Ok(())
    }

    async fn failed(&self, requester: RequesterId, id: JobId, reason: &str) -> Result<()> {
        self.record(id, requester, NotificationKind::Failed(reason.to_string()));
        Ok(())
    }

    async fn oversize(
        &self,
        requester: RequesterId,
        id: JobId,
        size_bytes: u64,
        limit_bytes: u64,
    ) -> Result<()> {
        self.record(
            id,
            requester,
            NotificationKind::Oversize { size_bytes, limit_bytes },
        );
        Ok(())
    }

    async fn canceled(&self, requester: RequesterId, id: JobId) -> Result<()> {
        self.record(id, requester, NotificationKind::Canceled);
        Ok(())
    }
}

/// Notifier whose every call fails, for progression-under-delivery-error
/// tests
pub(crate) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn queued(&self, _requester: RequesterId, _id: JobId, _position: usize) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }

    async fn processing(&self, _requester: RequesterId, _id: JobId) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }

    async fn delivered(
        &self,
        _requester: RequesterId,
        _id: JobId,
        _artifact: &Path,
        _filename: &str,
    ) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }

    async fn failed(&self, _requester: RequesterId, _id: JobId, _reason: &str) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }

    async fn oversize(
        &self,
        _requester: RequesterId,
        _id: JobId,
        _size_bytes: u64,
        _limit_bytes: u64,
    ) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }

    async fn canceled(&self, _requester: RequesterId, _id: JobId) -> Result<()> {
        Err(Error::Delivery("messaging disabled".into()))
    }
}

/// Controller plus its fakes, temp dir kept alive for cleanup assertions
pub(crate) struct TestHarness {
    pub(crate) controller: QueueController,
    pub(crate) converter: Arc<ScriptedConverter>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) temp: TempDir,
}

pub(crate) fn harness() -> TestHarness {
    let temp = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.download.temp_dir = temp.path().to_path_buf();

    let converter = Arc::new(ScriptedConverter::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = QueueController::new(
        Arc::new(config),
        converter.clone(),
        notifier.clone(),
    );

    TestHarness {
        controller,
        converter,
        notifier,
        temp,
    }
}

/// Poll until `condition` holds, panicking after `timeout`
pub(crate) async fn wait_until(what: &str, timeout: Duration, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Default timeout for worker-driven conditions (the idle poll is 100 ms)
pub(crate) const WAIT: Duration = Duration::from_secs(5);
