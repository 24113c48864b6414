use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub worker: ComponentHealth,
    pub queue: QueueHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

#[derive(Serialize)]
pub struct QueueHealth {
    pub depth: usize,
}

/// GET /health — service health with worker and queue status.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let worker_running = state.messages.worker_running().await;

    let status_code = if worker_running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if worker_running {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            worker: ComponentHealth {
                status: if worker_running {
                    "running".to_string()
                } else {
                    "stopped".to_string()
                },
            },
            queue: QueueHealth {
                depth: state.messages.queue_depth(),
            },
        },
    };

    (status_code, Json(response))
}
