//! LLM agent collaborators used by the generation pipeline.
//!
//! Each agent is a narrow async trait with one method, so the pipeline can be
//! driven by real LLM-backed agents in production and by scripted doubles in tests.

use std::sync::Arc;

use async_trait::async_trait;
use strum::Display;

use crate::models::answer::VerifierReply;

pub mod client;
pub mod orchestrator;
pub mod reformulator;
pub mod verifier;

pub use client::ChatClient;
pub use orchestrator::LlmOrchestrator;
pub use reformulator::LlmReformulator;
pub use verifier::LlmVerifier;

/// Rewrites the user's question into a clean, self-contained research query.
#[async_trait]
pub trait Reformulator: Send + Sync {
    async fn reformulate(&self, original_message: &str) -> Result<String, AgentError>;
}

/// Produces a candidate answer for a question and its reformulation.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn answer(
        &self,
        original_message: &str,
        reformulated_query: &str,
    ) -> Result<String, AgentError>;
}

/// Approves a candidate answer or asks for a revision.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        original_message: &str,
        reformulated_query: &str,
        candidate_answer: &str,
    ) -> Result<VerifierReply, AgentError>;
}

/// The three collaborators a pipeline run needs.
#[derive(Clone)]
pub struct Agents {
    pub reformulator: Arc<dyn Reformulator>,
    pub orchestrator: Arc<dyn Orchestrator>,
    pub verifier: Arc<dyn Verifier>,
}

impl Agents {
    pub fn new(
        reformulator: Arc<dyn Reformulator>,
        orchestrator: Arc<dyn Orchestrator>,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        Self {
            reformulator,
            orchestrator,
            verifier,
        }
    }

    /// LLM-backed agents sharing one chat client.
    pub fn from_chat_client(client: Arc<ChatClient>) -> Self {
        Self::new(
            Arc::new(LlmReformulator::new(client.clone())),
            Arc::new(LlmOrchestrator::new(client.clone())),
            Arc::new(LlmVerifier::new(client)),
        )
    }
}

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum AgentRole {
    Reformulator,
    Orchestrator,
    Verifier,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse agent response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Agent returned an empty reply")]
    EmptyReply,

    #[error("Agent reply did not match the expected format: {0}")]
    MalformedReply(String),

    #[error("{0}")]
    Other(String),
}
