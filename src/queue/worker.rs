//! Worker — the single perpetual consumer loop.
//!
//! Only this loop ever invokes the converter. Each iteration dequeues
//! one job, runs it to a terminal outcome, cleans up its temporary
//! storage, and moves on; nothing that happens inside one job can stop
//! the loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{Artifact, Event, Job};

use super::{CurrentJob, QueueController};

/// Interval between queue polling attempts when the queue is empty
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl QueueController {
    /// Start the worker loop
    ///
    /// Spawns the background task that continuously:
    /// 1. Pops the next job and marks it current (one lock scope, so a
    ///    drain never observes a job that is neither pending nor current)
    /// 2. Runs the converter under the job's cancellation token
    /// 3. Reports the terminal outcome via the notifier
    /// 4. Removes the job's temp directory and clears `current`
    ///
    /// Call exactly once at process startup.
    pub fn start_worker(&self) -> tokio::task::JoinHandle<()> {
        let controller = self.clone();

        tokio::spawn(async move {
            loop {
                let next = {
                    let mut state = controller.state.lock().await;
                    match state.pending.pop_front() {
                        Some(job) => {
                            let cancel_token = CancellationToken::new();
                            state.current = Some(CurrentJob {
                                job: job.clone(),
                                cancel_token: cancel_token.clone(),
                            });
                            Some((job, cancel_token))
                        }
                        None => None,
                    }
                };

                match next {
                    Some((job, cancel_token)) => {
                        controller.run_job(job, cancel_token).await;
                        controller.state.lock().await.current = None;
                    }
                    None => {
                        // Queue is empty, wait a bit before checking again
                        tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
                    }
                }
            }
        })
    }

    /// Run one job to its terminal outcome and clean up after it
    async fn run_job(&self, job: Job, cancel_token: CancellationToken) {
        let id = job.id;
        tracing::info!(job_id = id.0, source = %job.source, "job started");
        self.emit_event(Event::Started { id });
        self.log_delivery_failure(
            self.notifier.processing(job.requester, id).await,
            id,
            "processing",
        );

        let work_dir = self.config.download.temp_dir.join(format!("job_{}", id.0));
        let outcome = match tokio::fs::create_dir_all(&work_dir).await {
            Ok(()) => self.execute(&job, &work_dir, &cancel_token).await,
            Err(e) => Err(Error::Conversion(format!(
                "failed to create work directory: {}",
                e
            ))),
        };

        self.report_outcome(&job, outcome).await;

        // Temp storage is released on every exit path; a failed removal
        // is a logged warning, never surfaced to the requester.
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                job_id = id.0,
                path = ?work_dir,
                error = %e,
                "failed to remove job work directory"
            );
        }
    }

    /// Invoke the converter, racing it against the cancellation token
    ///
    /// The converter runs in its own task so a panic inside it is
    /// contained and reported as a conversion failure. The select is
    /// biased toward cancellation, and the token is re-checked after a
    /// successful conversion: a job whose cancellation was signaled can
    /// never report success.
    async fn execute(
        &self,
        job: &Job,
        work_dir: &Path,
        cancel_token: &CancellationToken,
    ) -> Result<Artifact> {
        let converter = Arc::clone(&self.converter);
        let source = job.source.clone();
        let name_override = job.name_override.clone();
        let work_dir_owned = work_dir.to_path_buf();
        let token = cancel_token.clone();

        let mut handle = tokio::spawn(async move {
            converter
                .convert(&source, name_override.as_deref(), &work_dir_owned, &token)
                .await
        });

        let converted = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                // Cancel-opaque converters are abandoned here; cooperative
                // ones saw the token and are already stopping.
                handle.abort();
                Err(Error::Canceled)
            }
            joined = &mut handle => match joined {
                Ok(result) => result,
                Err(e) => Err(Error::Conversion(format!("converter crashed: {}", e))),
            },
        };

        match converted {
            Ok(_) if cancel_token.is_cancelled() => Err(Error::Canceled),
            other => other,
        }
    }

    /// Classify the outcome and send the job's single terminal
    /// notification
    async fn report_outcome(&self, job: &Job, outcome: Result<Artifact>) {
        let id = job.id;
        match outcome {
            Ok(artifact) => {
                let limit_bytes = self.config.download.max_artifact_bytes;
                if artifact.size_bytes > limit_bytes {
                    tracing::warn!(
                        job_id = id.0,
                        size_bytes = artifact.size_bytes,
                        limit_bytes,
                        "artifact exceeds delivery ceiling"
                    );
                    self.emit_event(Event::Oversize {
                        id,
                        size_bytes: artifact.size_bytes,
                    });
                    self.log_delivery_failure(
                        self.notifier
                            .oversize(job.requester, id, artifact.size_bytes, limit_bytes)
                            .await,
                        id,
                        "oversize",
                    );
                } else {
                    tracing::info!(
                        job_id = id.0,
                        size_bytes = artifact.size_bytes,
                        filename = %artifact.filename,
                        "job delivered"
                    );
                    self.emit_event(Event::Delivered {
                        id,
                        size_bytes: artifact.size_bytes,
                    });
                    self.log_delivery_failure(
                        self.notifier
                            .delivered(job.requester, id, &artifact.path, &artifact.filename)
                            .await,
                        id,
                        "delivered",
                    );
                }
            }
            Err(Error::Canceled) => {
                tracing::info!(job_id = id.0, "job canceled");
                self.emit_event(Event::Canceled { id });
                self.log_delivery_failure(
                    self.notifier.canceled(job.requester, id).await,
                    id,
                    "canceled",
                );
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(job_id = id.0, error = %reason, "job failed");
                self.emit_event(Event::Failed {
                    id,
                    error: reason.clone(),
                });
                self.log_delivery_failure(
                    self.notifier.failed(job.requester, id, &reason).await,
                    id,
                    "failed",
                );
            }
        }
    }
}
