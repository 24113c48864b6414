use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentError, ChatClient, Orchestrator};

const SYSTEM_PROMPT: &str = concat!(
    "You answer questions about the Pole Universitaire Leonard de Vinci (ESILV, EMLV, IIM) ",
    "in Paris La Defense: programs, services and student life. ",
    "Cite where facts come from, answer in Markdown, and use the user's language."
);

pub struct LlmOrchestrator {
    client: Arc<ChatClient>,
}

impl LlmOrchestrator {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

fn user_prompt(original_message: &str, reformulated_query: &str) -> String {
    format!(
        "Original user question:\n{original_message}\n\n\
         Reformulated query for research:\n{reformulated_query}\n\n\
         Provide the final answer."
    )
}

#[async_trait]
impl Orchestrator for LlmOrchestrator {
    async fn answer(
        &self,
        original_message: &str,
        reformulated_query: &str,
    ) -> Result<String, AgentError> {
        let prompt = user_prompt(original_message, reformulated_query);
        self.client.complete(SYSTEM_PROMPT, &prompt).await
    }
}
