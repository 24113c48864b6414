use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::JobState;
use crate::services::pipeline::GenerationPipeline;
use crate::services::queue::JobReceiver;
use crate::services::registry::JobRegistry;

/// Error text stored on a job that was in flight when the worker stopped.
pub const INTERRUPTED_MESSAGE: &str = "Le traitement a été interrompu.";

/// Prefix of the error stored on a job whose pipeline panicked.
pub const PANICKED_MESSAGE: &str = "Answer pipeline panicked";

/// The single background task that answers queued jobs one at a time.
pub struct Worker {
    registry: Arc<JobRegistry>,
    pipeline: Arc<GenerationPipeline>,
    receiver: JobReceiver,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(
        registry: Arc<JobRegistry>,
        pipeline: Arc<GenerationPipeline>,
        receiver: JobReceiver,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            pipeline,
            receiver,
            shutdown,
        }
    }

    /// Process jobs until the queue closes or the worker is cancelled.
    ///
    /// Pipeline failures, panics included, are stored on their job and never
    /// end the loop.
    /// Cancellation is returned as an error so the owner sees the shutdown.
    pub async fn run(mut self) -> Result<(), WorkerError> {
        tracing::info!("Worker ready, starting job processing loop");

        loop {
            let job_id = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Worker cancelled while idle");
                    return Err(WorkerError::Cancelled);
                }
                next = self.receiver.dequeue() => match next {
                    Some(job_id) => job_id,
                    None => {
                        tracing::info!("Job queue closed, worker exiting");
                        return Ok(());
                    }
                },
            };

            self.process(job_id).await?;
        }
    }

    async fn process(&self, job_id: Uuid) -> Result<(), WorkerError> {
        let Some(user_message) = self.registry.mark_processing(job_id).await else {
            tracing::debug!(job_id = %job_id, "Dequeued job is not pending, skipping");
            return Ok(());
        };

        tracing::info!(job_id = %job_id, "Processing message job");
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::warn!(job_id = %job_id, "Worker cancelled mid-job");
                self.registry
                    .transition(job_id, JobState::Failed(INTERRUPTED_MESSAGE.to_string()))
                    .await;
                metrics::counter!("message_jobs_failed").increment(1);
                return Err(WorkerError::Interrupted { job_id });
            }
            outcome = AssertUnwindSafe(self.pipeline.run(&user_message)).catch_unwind() => outcome,
        };

        match outcome {
            Ok(Ok(payload)) => {
                tracing::info!(
                    job_id = %job_id,
                    attempts = payload.attempts,
                    verification_status = %payload.verification_status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job completed successfully"
                );
                self.registry
                    .transition(job_id, JobState::Completed(payload))
                    .await;
                metrics::counter!("message_jobs_completed").increment(1);
            }
            Ok(Err(e)) => {
                tracing::error!(job_id = %job_id, error = %e, "Job processing failed");
                self.registry
                    .transition(job_id, JobState::Failed(e.to_string()))
                    .await;
                metrics::counter!("message_jobs_failed").increment(1);
            }
            Err(panic) => {
                let reason = panic_reason(panic.as_ref());
                tracing::error!(job_id = %job_id, reason = %reason, "Job pipeline panicked");
                self.registry
                    .transition(
                        job_id,
                        JobState::Failed(format!("{PANICKED_MESSAGE}: {reason}")),
                    )
                    .await;
                metrics::counter!("message_jobs_failed").increment(1);
            }
        }

        Ok(())
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(reason) = panic.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = panic.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker cancelled while idle")]
    Cancelled,

    #[error("Worker cancelled while processing job {job_id}")]
    Interrupted { job_id: Uuid },

    #[error("Worker task panicked: {0}")]
    Panicked(String),
}
