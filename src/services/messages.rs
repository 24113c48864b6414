use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::{JobSnapshot, JobState};
use crate::models::message::ValidationError;
use crate::services::pipeline::GenerationPipeline;
use crate::services::queue::{JobQueue, JobReceiver};
use crate::services::registry::JobRegistry;
use crate::services::worker::{Worker, WorkerError};

const UNAVAILABLE_MESSAGE: &str = "Le service de traitement est arrêté.";

/// Owns the job registry, the queue and the worker task.
///
/// Constructed once and shared with the HTTP layer through `AppState`.
pub struct MessageService {
    registry: Arc<JobRegistry>,
    queue: JobQueue,
    pipeline: Arc<GenerationPipeline>,
    shutdown: CancellationToken,
    /// Set once the worker has been started; checked before taking the lock.
    started: AtomicBool,
    worker: Mutex<WorkerSlot>,
}

struct WorkerSlot {
    receiver: Option<JobReceiver>,
    handle: Option<JoinHandle<Result<(), WorkerError>>>,
}

impl MessageService {
    pub fn new(pipeline: GenerationPipeline) -> Self {
        let (queue, receiver) = JobQueue::new();
        Self {
            registry: Arc::new(JobRegistry::new()),
            queue,
            pipeline: Arc::new(pipeline),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            worker: Mutex::new(WorkerSlot {
                receiver: Some(receiver),
                handle: None,
            }),
        }
    }

    /// Spawn the worker if no one has yet. Safe to call from many tasks at once.
    pub async fn start(&self) {
        if self.started.load(Ordering::Acquire) {
            return;
        }

        let mut slot = self.worker.lock().await;
        let Some(receiver) = slot.receiver.take() else {
            return;
        };

        let worker = Worker::new(
            self.registry.clone(),
            self.pipeline.clone(),
            receiver,
            self.shutdown.clone(),
        );
        slot.handle = Some(tokio::spawn(worker.run()));
        self.started.store(true, Ordering::Release);
        tracing::info!(
            max_attempts = self.pipeline.max_attempts(),
            "Message worker started"
        );
    }

    /// Validate and queue a question, returning its job id.
    ///
    /// Starts the worker on first valid submission if `start` was never called.
    pub async fn submit(&self, user_message: &str) -> Result<Uuid, SubmitError> {
        if self.shutdown.is_cancelled() {
            return Err(SubmitError::Unavailable);
        }

        let job_id = self.registry.create(user_message).await?;
        self.start().await;
        self.dispatch(job_id).await?;
        Ok(job_id)
    }

    /// Hand a freshly created job to the worker.
    async fn dispatch(&self, job_id: Uuid) -> Result<(), SubmitError> {
        // A stop that lands after the check in `submit` leaves nobody to take the job.
        if self.queue.enqueue(job_id).is_err() || self.shutdown.is_cancelled() {
            self.abandon(job_id).await;
            return Err(SubmitError::Unavailable);
        }

        metrics::counter!("message_jobs_total").increment(1);
        tracing::info!(job_id = %job_id, "Message job queued");
        Ok(())
    }

    /// Close out a job that will never be processed.
    ///
    /// Both transitions are rejected if the worker already reached the job.
    async fn abandon(&self, job_id: Uuid) {
        self.registry.transition(job_id, JobState::Processing).await;
        self.registry
            .transition(job_id, JobState::Failed(UNAVAILABLE_MESSAGE.to_string()))
            .await;
        tracing::warn!(job_id = %job_id, "Message job rejected, worker unavailable");
    }

    /// Current snapshot of a job, `None` when the id is unknown.
    pub async fn status(&self, job_id: Uuid) -> Option<JobSnapshot> {
        self.registry.get(job_id).await
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.queue_depth()
    }

    /// Whether the worker task has been started and has not exited.
    pub async fn worker_running(&self) -> bool {
        let slot = self.worker.lock().await;
        slot.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the worker and wait for it to exit.
    ///
    /// A job in flight is finalized as interrupted. Returns the worker's own
    /// result so the caller can see how it stopped.
    pub async fn stop(&self) -> Result<(), WorkerError> {
        self.shutdown.cancel();

        let handle = {
            let mut slot = self.worker.lock().await;
            // Never start a worker after stop.
            slot.receiver = None;
            slot.handle.take()
        };

        let Some(handle) = handle else {
            return Ok(());
        };

        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(WorkerError::Panicked(e.to_string())),
        };
        match &result {
            Err(WorkerError::Interrupted { job_id }) => {
                tracing::warn!(job_id = %job_id, "Worker stopped with a job in flight")
            }
            Err(e) => tracing::info!(reason = %e, "Worker stopped"),
            Ok(()) => tracing::info!("Worker stopped"),
        }
        result
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Message processing is unavailable")]
    Unavailable,
}
