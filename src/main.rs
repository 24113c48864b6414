use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use chatakon_agentic::app_state::{AppState, PollingHints};
use chatakon_agentic::config::AppConfig;
use chatakon_agentic::routes;
use chatakon_agentic::services::{
    agents::{Agents, ChatClient},
    messages::MessageService,
    pipeline::GenerationPipeline,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing chatakon-agentic server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe_metrics();

    // Initialize LLM agents
    let chat_client = ChatClient::new(
        &config.llm_api_base,
        &config.llm_api_key,
        &config.llm_model,
        Duration::from_secs(config.llm_timeout_secs),
    )
    .expect("Failed to initialize LLM client");
    tracing::info!(
        api_base = %config.llm_api_base,
        model = chat_client.model(),
        "LLM client ready"
    );
    let agents = Agents::from_chat_client(Arc::new(chat_client));

    let pipeline = GenerationPipeline::new(agents, config.max_attempts, &config.fallback_message);
    let messages = MessageService::new(pipeline);
    messages.start().await;

    let state = AppState::new(
        messages,
        PollingHints {
            interval_ms: config.poll_interval_ms,
            max_duration_secs: config.max_poll_duration_secs,
        },
    );

    // Build API routes
    let app = routes::router()
        .with_state(state.clone())
        .merge(
            Router::new()
                .route("/metrics", get(routes::metrics::prometheus_metrics))
                .with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(16 * 1024)); // 16 KB limit

    tracing::info!("Starting chatakon-agentic on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    if let Err(e) = state.messages.stop().await {
        tracing::warn!(error = %e, "Worker shut down");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
