use std::time::Instant;

use chrono::Utc;

use crate::models::answer::{AnswerPayload, Verdict, VerificationStatus};
use crate::services::agents::{AgentError, AgentRole, Agents};

/// Bounded reformulate -> generate -> verify loop for one question.
pub struct GenerationPipeline {
    agents: Agents,
    max_attempts: u32,
    fallback_message: String,
}

impl GenerationPipeline {
    pub fn new(agents: Agents, max_attempts: u32, fallback_message: impl Into<String>) -> Self {
        Self {
            agents,
            max_attempts: max_attempts.max(1),
            fallback_message: fallback_message.into(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run up to `max_attempts` cycles until the verifier approves.
    ///
    /// A `revise` verdict on the last attempt yields the fallback answer. Any
    /// agent error aborts the run and does not count as an attempt outcome.
    pub async fn run(&self, original_message: &str) -> Result<AnswerPayload, PipelineError> {
        let start = Instant::now();
        let mut last_reformulation: Option<String> = None;
        let mut last_feedback: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            let reformulated_query = self
                .agents
                .reformulator
                .reformulate(original_message)
                .await
                .map_err(|e| PipelineError::agent(AgentRole::Reformulator, attempt, e))?;
            last_reformulation = Some(reformulated_query.clone());

            let candidate = self
                .agents
                .orchestrator
                .answer(original_message, &reformulated_query)
                .await
                .map_err(|e| PipelineError::agent(AgentRole::Orchestrator, attempt, e))?;

            let reply = self
                .agents
                .verifier
                .verify(original_message, &reformulated_query, &candidate)
                .await
                .map_err(|e| PipelineError::agent(AgentRole::Verifier, attempt, e))?;
            last_feedback = reply.feedback.clone();

            tracing::info!(
                attempt,
                max_attempts = self.max_attempts,
                verdict = %reply.verdict,
                "Verifier verdict received"
            );

            if reply.verdict == Verdict::Approved {
                let message = reply
                    .usable_final_answer()
                    .map(str::to_string)
                    .unwrap_or(candidate);
                record_outcome(attempt, start);
                return Ok(AnswerPayload {
                    message,
                    verification_status: VerificationStatus::Approved,
                    attempts: attempt,
                    reformulated_query: Some(reformulated_query),
                    verifier_feedback: reply.feedback,
                    created_at: Utc::now(),
                });
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            feedback = last_feedback.as_deref().unwrap_or(""),
            "No answer approved, returning fallback"
        );
        metrics::counter!("message_verification_fallbacks_total").increment(1);
        record_outcome(self.max_attempts, start);

        Ok(AnswerPayload {
            message: self.fallback_message.clone(),
            verification_status: VerificationStatus::Fallback,
            attempts: self.max_attempts,
            reformulated_query: last_reformulation,
            verifier_feedback: last_feedback,
            created_at: Utc::now(),
        })
    }
}

fn record_outcome(attempts: u32, start: Instant) {
    metrics::histogram!("message_verification_attempts").record(attempts as f64);
    metrics::histogram!("message_pipeline_seconds").record(start.elapsed().as_secs_f64());
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{role} failed on attempt {attempt}: {source}")]
    Agent {
        role: AgentRole,
        attempt: u32,
        #[source]
        source: AgentError,
    },
}

impl PipelineError {
    fn agent(role: AgentRole, attempt: u32, source: AgentError) -> Self {
        PipelineError::Agent {
            role,
            attempt,
            source,
        }
    }
}
