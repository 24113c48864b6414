use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentError, ChatClient, Verifier};
use crate::models::answer::VerifierReply;

const SYSTEM_PROMPT: &str = concat!(
    "You verify proposed answers about the Pole Universitaire Leonard de Vinci (ESILV, EMLV, IIM). ",
    "Approve only answers that match the question, stay on the Pole and its schools, ",
    "are grounded in cited evidence and use the user's language. Otherwise ask for a revision.\n",
    "Respond strictly in JSON: ",
    r#"{"status": "approved|revise", "final_answer": "string", "feedback": "string describing issues"}. "#,
    "When approving you may lightly edit final_answer for clarity."
);

pub struct LlmVerifier {
    client: Arc<ChatClient>,
}

impl LlmVerifier {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

fn user_prompt(original_message: &str, reformulated_query: &str, candidate_answer: &str) -> String {
    format!(
        "Original question:\n{original_message}\n\n\
         Reformulated query:\n{reformulated_query}\n\n\
         Proposed answer (markdown allowed):\n{candidate_answer}\n\n\
         Return the JSON verdict now."
    )
}

/// Parse a verdict out of the model's reply.
///
/// Tolerates a surrounding Markdown code fence or prose around the JSON
/// object. Anything else is a malformed reply, not a request for revision.
pub fn parse_verdict(content: &str) -> Result<VerifierReply, AgentError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(AgentError::MalformedReply(format!(
                "no JSON object in verifier reply: {}",
                truncate(content, 200)
            )))
        }
    };

    serde_json::from_str(json).map_err(|e| {
        AgentError::MalformedReply(format!("invalid verdict JSON ({e}): {}", truncate(json, 200)))
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl Verifier for LlmVerifier {
    async fn verify(
        &self,
        original_message: &str,
        reformulated_query: &str,
        candidate_answer: &str,
    ) -> Result<VerifierReply, AgentError> {
        let prompt = user_prompt(original_message, reformulated_query, candidate_answer);
        let content = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        parse_verdict(&content)
    }
}
