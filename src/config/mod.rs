use garde::Validate;
use serde::Deserialize;

/// Answer shown when no attempt is approved within the attempt ceiling.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Je n'ai pas pu vérifier une réponse fiable pour le moment. \
     Merci de contacter la scolarité à scolarite@esilv.com.";

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind_addr")]
    #[garde(length(min = 1))]
    pub bind_addr: String,

    /// Base URL of the OpenAI-compatible chat completions API
    #[serde(default = "default_llm_api_base")]
    #[garde(custom(http_url))]
    pub llm_api_base: String,

    /// Bearer token for the LLM API
    #[garde(length(min = 1))]
    pub llm_api_key: String,

    /// Chat model used by every agent
    #[serde(default = "default_llm_model")]
    #[garde(length(min = 1))]
    pub llm_model: String,

    /// Per-request timeout for agent calls
    #[serde(default = "default_llm_timeout_secs")]
    #[garde(range(min = 1, max = 600))]
    pub llm_timeout_secs: u64,

    /// Reformulate/generate/verify cycles before falling back
    #[serde(default = "default_max_attempts")]
    #[garde(range(min = 1, max = 10))]
    pub max_attempts: u32,

    #[serde(default = "default_fallback_message")]
    #[garde(length(min = 1))]
    pub fallback_message: String,

    /// Poll interval advertised to clients. Not enforced server-side.
    #[serde(default = "default_poll_interval_ms")]
    #[garde(range(min = 100))]
    pub poll_interval_ms: u64,

    /// How long clients should keep polling before giving up. Not enforced server-side.
    #[serde(default = "default_max_poll_duration_secs")]
    #[garde(range(min = 1))]
    pub max_poll_duration_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_duration_secs() -> u64 {
    300
}

fn http_url(value: &str, _ctx: &()) -> garde::Result {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(garde::Error::new("must be an http(s) URL"))
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
