use async_trait::async_trait;
use serde_json::{Map, Value};

use super::llm::{ChatMessage, LlmClient};
use super::{Agent, AgentConfig, AgentKind, AgentResponse};

const SYSTEM_PROMPT: &str = "You are the friendly barista assistant of Black Coffee Terminal, \
a shop that serves premium black coffee only. Answer clearly and concisely.";

/// Build the LLM client for an agent, or the reason it cannot be built.
pub(super) fn build_client(config: &AgentConfig) -> Result<LlmClient, String> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| "LLM API key not configured (set LLM_API_KEY)".to_string())?;
    LlmClient::new(api_key, &config.endpoint, &config.model, config.max_tokens)
}

pub struct ChatAgent {
    client: Result<LlmClient, String>,
}

impl ChatAgent {
    pub fn new(config: &AgentConfig) -> Self {
        let client = build_client(config);
        if let Err(e) = &client {
            log::warn!("Chat agent unavailable: {}", e);
        }
        Self { client }
    }
}

#[async_trait]
impl Agent for ChatAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Chat
    }

    async fn execute(&self, prompt: &str, _use_tools: bool) -> AgentResponse {
        let client = match &self.client {
            Ok(c) => c,
            Err(e) => return AgentResponse::failure(e.clone()),
        };

        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        match client.generate_text(&messages).await {
            Ok(content) => {
                let mut metadata = Map::new();
                metadata.insert("agent_type".to_string(), Value::from("chat"));
                metadata.insert("model".to_string(), Value::from(client.model()));
                AgentResponse::ok(content, metadata)
            }
            Err(e) => {
                log::error!("Chat agent failed: {}", e);
                AgentResponse::failure(e)
            }
        }
    }

    fn capabilities(&self) -> Vec<String> {
        [
            "Natural conversation",
            "Question answering",
            "Coffee recommendations",
            "Problem solving",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
