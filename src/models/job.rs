use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::models::answer::AnswerPayload;

/// Public status of a message job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// Lifecycle state of a job. The payload lives on the variant, so a
/// terminal job carries exactly one of a result or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Queued,
    Processing,
    Completed(AnswerPayload),
    Failed(String),
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued => JobStatus::Queued,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed(_) => JobStatus::Completed,
            JobState::Failed(_) => JobStatus::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed(_) | JobState::Failed(_))
    }

    /// `queued -> processing -> {completed | error}`, nothing else.
    pub fn can_transition_to(&self, next: &JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Processing)
                | (JobState::Processing, JobState::Completed(_))
                | (JobState::Processing, JobState::Failed(_))
        )
    }
}

/// A submitted question and its outcome, owned by the registry.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub user_message: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(user_message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_message,
            state: JobState::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Read-only projection returned to status queries. Leaves out the user message.
    pub fn snapshot(&self) -> JobSnapshot {
        let (result, error) = match &self.state {
            JobState::Completed(payload) => (Some(payload.clone()), None),
            JobState::Failed(reason) => (None, Some(reason.clone())),
            JobState::Queued | JobState::Processing => (None, None),
        };

        JobSnapshot {
            job_id: self.id,
            status: self.state.status(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            result,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<AnswerPayload>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::VerificationStatus;

    fn payload() -> AnswerPayload {
        AnswerPayload {
            message: "answer".to_string(),
            verification_status: VerificationStatus::Approved,
            attempts: 1,
            reformulated_query: Some("query".to_string()),
            verifier_feedback: None,
            created_at: chrono::DateTime::default(),
        }
    }

    #[test]
    fn test_forward_transitions_only() {
        let done = JobState::Completed(payload());
        let failed = JobState::Failed("boom".to_string());

        assert!(JobState::Queued.can_transition_to(&JobState::Processing));
        assert!(JobState::Processing.can_transition_to(&done));
        assert!(JobState::Processing.can_transition_to(&failed));

        assert!(!JobState::Queued.can_transition_to(&done));
        assert!(!JobState::Queued.can_transition_to(&failed));
        assert!(!JobState::Processing.can_transition_to(&JobState::Queued));
        assert!(!done.can_transition_to(&JobState::Processing));
        assert!(!failed.can_transition_to(&done));
    }

    #[test]
    fn test_snapshot_carries_result_only_when_completed() {
        let mut job = Job::new("Quels sont les horaires ?".to_string());
        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Queued);
        assert!(snapshot.result.is_none() && snapshot.error.is_none());

        job.state = JobState::Completed(payload());
        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.result, Some(payload()));
        assert!(snapshot.error.is_none());

        job.state = JobState::Failed("agent down".to_string());
        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Error);
        assert!(snapshot.result.is_none());
        assert_eq!(snapshot.error.as_deref(), Some("agent down"));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(JobStatus::Error).unwrap(), "error");
        assert_eq!(JobStatus::Processing.to_string(), "processing");
    }
}
