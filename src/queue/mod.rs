//! Job queue and worker lifecycle, split into focused submodules.
//!
//! - [`controller`] - Submission, status reporting, bulk cancellation
//! - [`worker`] - The single perpetual consumer loop
//!
//! One job executes at a time; everything else waits in arrival order.

mod controller;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::converter::Converter;
use crate::notifier::Notifier;
use crate::types::{Event, Job, JobId};

/// The job presently executing, paired with the handle that interrupts it
pub(crate) struct CurrentJob {
    pub(crate) job: Job,
    pub(crate) cancel_token: CancellationToken,
}

/// Queue state: everything submission, dequeue, drain, and cancellation
/// race over, behind one lock so position accounting and drain counts
/// are always consistent.
pub(crate) struct QueueState {
    /// Pending jobs, insertion order = arrival order
    pub(crate) pending: VecDeque<Job>,
    /// At most one executing job
    pub(crate) current: Option<CurrentJob>,
    /// Next sequence id, never reused
    pub(crate) next_id: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            next_id: 1,
        }
    }
}

/// The queue façade the rest of the system talks to (cloneable - all
/// fields are Arc-wrapped)
///
/// Construct once at startup, call [`start_worker`](Self::start_worker)
/// once, then hand clones to whatever layer dispatches inbound commands.
#[derive(Clone)]
pub struct QueueController {
    pub(crate) state: Arc<Mutex<QueueState>>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Conversion backend (trait object for pluggable implementations)
    pub(crate) converter: Arc<dyn Converter>,
    /// Requester messaging (trait object for pluggable implementations)
    pub(crate) notifier: Arc<dyn Notifier>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl QueueController {
    /// Create a controller with injected collaborators
    pub fn new(
        config: Arc<Config>,
        converter: Arc<dyn Converter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(QueueState::new())),
            config,
            converter,
            notifier,
            event_tx,
        }
    }

    /// Subscribe to job lifecycle events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// If no one is listening the event is silently dropped; processing
    /// never depends on observers.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Log-and-continue wrapper for notifier calls: delivery failures
    /// never propagate into queue control flow.
    pub(crate) fn log_delivery_failure(
        &self,
        result: crate::error::Result<()>,
        id: JobId,
        what: &str,
    ) {
        if let Err(e) = result {
            tracing::warn!(job_id = id.0, error = %e, "failed to send {} notification", what);
        }
    }
}
