use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentError, ChatClient, Reformulator};

const SYSTEM_PROMPT: &str = concat!(
    "You rewrite student questions about the Pole Universitaire Leonard de Vinci ",
    "(ESILV, EMLV, IIM) into one clear, self-contained search query. ",
    "Keep the user's language and every constraint they gave. ",
    "Do not answer the question."
);

pub struct LlmReformulator {
    client: Arc<ChatClient>,
}

impl LlmReformulator {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reformulator for LlmReformulator {
    async fn reformulate(&self, original_message: &str) -> Result<String, AgentError> {
        let reply = self.client.complete(SYSTEM_PROMPT, original_message).await?;
        Ok(reply.trim().to_string())
    }
}
