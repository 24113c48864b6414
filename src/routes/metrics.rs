use std::sync::Arc;

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// Register descriptions for every metric the service emits.
pub fn describe_metrics() {
    metrics::describe_counter!("message_jobs_total", "Total message jobs submitted");
    metrics::describe_counter!("message_jobs_completed", "Total message jobs completed");
    metrics::describe_counter!(
        "message_jobs_failed",
        "Total message jobs that ended in error, including interrupted ones"
    );
    metrics::describe_gauge!(
        "message_queue_depth",
        "Current number of jobs waiting for the worker"
    );
    metrics::describe_histogram!(
        "message_pipeline_seconds",
        metrics::Unit::Seconds,
        "Time spent in the reformulate/generate/verify loop per job"
    );
    metrics::describe_histogram!(
        "message_verification_attempts",
        "Verification attempts used per finished pipeline run"
    );
    metrics::describe_counter!(
        "message_verification_fallbacks_total",
        "Pipeline runs that returned the fallback answer"
    );
}

/// GET /metrics — Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}
