use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::job::{Job, JobSnapshot, JobState};
use crate::models::message::{MessageRequest, ValidationError};

/// Result of asking the registry to move a job to a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The move would regress or skip a state; nothing was written.
    Rejected,
    UnknownJob,
}

/// In-memory store of every job for the lifetime of the process.
///
/// All reads and writes go through one lock over the job map. Readers only
/// ever receive snapshots, never references into the map.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a question and store it as a new queued job.
    pub async fn create(&self, user_message: &str) -> Result<Uuid, ValidationError> {
        let message = MessageRequest::new(user_message).into_validated()?;
        let job = Job::new(message);
        let id = job.id;

        self.jobs.write().await.insert(id, job);
        tracing::debug!(job_id = %id, "Job registered");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Option<JobSnapshot> {
        self.jobs.read().await.get(&id).map(Job::snapshot)
    }

    /// Stored question of a job, for the worker.
    pub async fn user_message(&self, id: Uuid) -> Option<String> {
        self.jobs
            .read()
            .await
            .get(&id)
            .map(|job| job.user_message.clone())
    }

    /// Apply a lifecycle move if it is legal, stamping the matching timestamp.
    ///
    /// Timestamps are clamped so `created_at <= started_at <= finished_at`
    /// holds even if the wall clock steps backwards.
    pub async fn transition(&self, id: Uuid, next: JobState) -> TransitionOutcome {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            tracing::debug!(job_id = %id, "Transition for unknown job ignored");
            return TransitionOutcome::UnknownJob;
        };

        if !job.state.can_transition_to(&next) {
            tracing::warn!(
                job_id = %id,
                from = %job.state.status(),
                to = %next.status(),
                "Illegal job transition rejected"
            );
            return TransitionOutcome::Rejected;
        }

        let now = Utc::now();
        match next {
            JobState::Processing => {
                job.started_at = Some(now.max(job.created_at));
            }
            JobState::Completed(_) | JobState::Failed(_) => {
                let floor = job.started_at.unwrap_or(job.created_at);
                job.finished_at = Some(now.max(floor));
            }
            JobState::Queued => {}
        }
        job.state = next;
        TransitionOutcome::Applied
    }

    /// Move a queued job to processing and hand back its question.
    /// `None` when the job is unknown or no longer queued.
    pub async fn mark_processing(&self, id: Uuid) -> Option<String> {
        match self.transition(id, JobState::Processing).await {
            TransitionOutcome::Applied => self.user_message(id).await,
            TransitionOutcome::Rejected | TransitionOutcome::UnknownJob => None,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
