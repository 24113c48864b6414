use std::sync::Arc;

use crate::services::messages::MessageService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<MessageService>,
    pub polling: PollingHints,
}

/// Polling cadence advertised to clients with every new job.
#[derive(Debug, Clone, Copy)]
pub struct PollingHints {
    pub interval_ms: u64,
    pub max_duration_secs: u64,
}

impl Default for PollingHints {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_duration_secs: 300,
        }
    }
}

impl AppState {
    pub fn new(messages: MessageService, polling: PollingHints) -> Self {
        Self {
            messages: Arc::new(messages),
            polling,
        }
    }
}
