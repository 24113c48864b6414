use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::{JobSnapshot, JobStatus};
use crate::models::message::{MessageJobCreateResponse, MessageRequest};
use crate::routes::ApiError;
use crate::services::messages::SubmitError;

/// POST /api/v1/message — Queue a question for answering.
pub async fn create_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageJobCreateResponse>, ApiError> {
    let job_id = state
        .messages
        .submit(&request.message)
        .await
        .map_err(|e| match e {
            SubmitError::Validation(invalid) => ApiError::BadRequest(invalid.to_string()),
            unavailable @ SubmitError::Unavailable => ApiError::Unavailable(unavailable.to_string()),
        })?;

    Ok(Json(MessageJobCreateResponse {
        job_id,
        status: JobStatus::Queued,
        poll_interval_ms: state.polling.interval_ms,
        max_poll_duration_secs: state.polling.max_duration_secs,
    }))
}

/// GET /api/v1/message/{job_id} — Get the status of a queued question.
pub async fn get_message(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    // Ids that do not parse cannot exist; report them like any unknown job.
    let job_id = Uuid::parse_str(&job_id).map_err(|_| ApiError::job_not_found())?;

    state
        .messages
        .status(job_id)
        .await
        .map(Json)
        .ok_or_else(ApiError::job_not_found)
}
