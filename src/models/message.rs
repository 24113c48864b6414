use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// Longest accepted question, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Request to queue a question for answering.
#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[garde(custom(trimmed_length))]
    pub message: String,
}

fn trimmed_length(value: &str, _ctx: &()) -> garde::Result {
    let chars = value.trim().chars().count();
    if chars == 0 {
        return Err(garde::Error::new("Message cannot be empty"));
    }
    if chars > MAX_MESSAGE_CHARS {
        return Err(garde::Error::new(format!(
            "Question is over {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(())
}

impl MessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Validate and return the trimmed question.
    pub fn into_validated(self) -> Result<String, ValidationError> {
        self.validate().map_err(ValidationError::from)?;
        Ok(self.message.trim().to_string())
    }
}

/// A submission that was rejected before any job was created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl From<garde::Report> for ValidationError {
    fn from(report: garde::Report) -> Self {
        let message = report
            .iter()
            .map(|(_, error)| error.message().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self(message)
    }
}

/// Response after queueing a question.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageJobCreateResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Suggested delay between status polls.
    pub poll_interval_ms: u64,
    /// Suggested time after which a client should stop polling.
    pub max_poll_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
