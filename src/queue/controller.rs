//! Submission, status reporting, and bulk cancellation.

use crate::types::{Event, Job, JobId, QueueStats, RequesterId};

use super::QueueController;

impl QueueController {
    /// Submit a conversion request
    ///
    /// Constructs a job with the next sequence id, appends it to the
    /// waiting queue, and returns the id together with the 1-based
    /// overall position: one slot for an executing job, if any, plus
    /// every waiting job up to and including this one. Position
    /// assignment and enqueue happen in a single lock scope, so
    /// positions handed to concurrent submitters always match the order
    /// jobs will actually run in.
    ///
    /// Enqueue is total: the queue is unbounded and never rejects a job.
    /// A requester may have any number of jobs queued at once.
    pub async fn submit(
        &self,
        requester: RequesterId,
        source: impl Into<String>,
        name_override: Option<String>,
    ) -> (JobId, usize) {
        let (id, position) = {
            let mut state = self.state.lock().await;
            let id = JobId(state.next_id);
            state.next_id += 1;

            state.pending.push_back(Job {
                id,
                requester,
                source: source.into(),
                name_override,
            });

            let position = state.pending.len() + usize::from(state.current.is_some());
            (id, position)
        };

        tracing::info!(job_id = id.0, requester = requester.0, position, "job queued");
        self.emit_event(Event::Queued { id, position });

        // Acknowledge outside the lock; a slow or failing notifier must
        // not serialize other submitters.
        self.log_delivery_failure(self.notifier.queued(requester, id, position).await, id, "queued");

        (id, position)
    }

    /// Snapshot of queue occupancy
    ///
    /// Advisory only: may be stale by the time the caller acts on it.
    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            running: usize::from(state.current.is_some()),
            waiting: state.pending.len(),
        }
    }

    /// Number of jobs waiting (excludes the executing job)
    pub async fn depth(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Human-readable queue summary
    pub async fn status_text(&self) -> String {
        let stats = self.stats().await;
        if stats.running == 0 && stats.waiting == 0 {
            "queue is empty".to_string()
        } else {
            format!("{} running, {} waiting", stats.running, stats.waiting)
        }
    }

    /// Evict every waiting job and signal cancellation of the executing
    /// one, if any
    ///
    /// Returns the number of jobs evicted from the waiting queue. The
    /// in-flight job is only signaled here: its canceled outcome is
    /// reported asynchronously by the worker once it settles, and is not
    /// counted in the return value. Each evicted requester still gets a
    /// canceled notification, so no job ends in silence.
    pub async fn cancel_all(&self) -> usize {
        let evicted: Vec<Job> = {
            let mut state = self.state.lock().await;
            let drained = state.pending.drain(..).collect();
            if let Some(ref current) = state.current {
                current.cancel_token.cancel();
            }
            drained
        };

        let count = evicted.len();
        tracing::info!(evicted = count, "waiting queue drained");
        self.emit_event(Event::Drained { evicted: count });

        for job in evicted {
            self.emit_event(Event::Canceled { id: job.id });
            self.log_delivery_failure(
                self.notifier.canceled(job.requester, job.id).await,
                job.id,
                "canceled",
            );
        }

        count
    }
}
