//! Chat and search agents: thin delegates over an LLM.
//!
//! Both agents are built once at startup and shared through `AppState`.

pub mod chat;
pub mod config;
pub mod llm;
pub mod search;
pub mod web_search;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use chat::ChatAgent;
pub use config::AgentConfig;
pub use search::SearchAgent;

/// Outcome of one agent execution. Failures are data, not errors.
#[derive(Debug, Clone, Default)]
pub struct AgentResponse {
    pub success: bool,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn ok(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            success: true,
            content: content.into(),
            metadata,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// `metadata.tools_used`, or 0 when absent.
    pub fn tools_used(&self) -> u64 {
        self.metadata
            .get("tools_used")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Run `prompt`. With `use_tools` the agent may call its tools before answering.
    async fn execute(&self, prompt: &str, use_tools: bool) -> AgentResponse;

    /// `execute` with a cap on how many results each lookup should fetch.
    /// Agents without lookups ignore it.
    async fn execute_with_limit(
        &self,
        prompt: &str,
        use_tools: bool,
        max_results: u32,
    ) -> AgentResponse {
        log::debug!("{} agent ignores max_results={}", self.kind(), max_results);
        self.execute(prompt, use_tools).await
    }

    fn capabilities(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Chat,
    Search,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Chat => "chat",
            AgentKind::Search => "search",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(AgentKind::Chat),
            "search" => Ok(AgentKind::Search),
            other => Err(format!("Unknown agent type: {}", other)),
        }
    }
}

/// The two agent handles.
#[derive(Clone)]
pub struct Agents {
    chat: Arc<dyn Agent>,
    search: Arc<dyn Agent>,
}

impl Agents {
    pub fn new(chat: Arc<dyn Agent>, search: Arc<dyn Agent>) -> Self {
        Self { chat, search }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            Arc::new(ChatAgent::new(config)),
            Arc::new(SearchAgent::new(config)),
        )
    }

    pub fn get(&self, kind: AgentKind) -> &Arc<dyn Agent> {
        match kind {
            AgentKind::Chat => &self.chat,
            AgentKind::Search => &self.search,
        }
    }

    pub fn chat(&self) -> &Arc<dyn Agent> {
        &self.chat
    }

    pub fn search(&self) -> &Arc<dyn Agent> {
        &self.search
    }
}

/// Scripted agent for handler tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    pub struct MockAgent {
        kind: AgentKind,
        response: AgentResponse,
        pub calls: Mutex<Vec<(String, bool)>>,
        pub limits: Mutex<Vec<u32>>,
    }

    impl MockAgent {
        pub fn replying(kind: AgentKind, content: &str, tools_used: u64) -> Self {
            let mut metadata = Map::new();
            metadata.insert("agent_type".to_string(), Value::from(kind.as_str()));
            metadata.insert("tools_used".to_string(), Value::from(tools_used));
            Self {
                kind,
                response: AgentResponse::ok(content, metadata),
                calls: Mutex::new(Vec::new()),
                limits: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(kind: AgentKind, error: &str) -> Self {
            Self {
                kind,
                response: AgentResponse::failure(error),
                calls: Mutex::new(Vec::new()),
                limits: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Agent for MockAgent {
        fn kind(&self) -> AgentKind {
            self.kind
        }

        async fn execute(&self, prompt: &str, use_tools: bool) -> AgentResponse {
            self.calls.lock().push((prompt.to_string(), use_tools));
            self.response.clone()
        }

        async fn execute_with_limit(
            &self,
            prompt: &str,
            use_tools: bool,
            max_results: u32,
        ) -> AgentResponse {
            self.limits.lock().push(max_results);
            self.execute(prompt, use_tools).await
        }

        fn capabilities(&self) -> Vec<String> {
            vec![format!("mock {}", self.kind)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_parse() {
        assert_eq!("chat".parse::<AgentKind>(), Ok(AgentKind::Chat));
        assert_eq!("search".parse::<AgentKind>(), Ok(AgentKind::Search));
        assert!("summarize".parse::<AgentKind>().is_err());
        assert_eq!(
            "Search".parse::<AgentKind>(),
            Err("Unknown agent type: Search".to_string())
        );
        assert!(" chat".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_tools_used_defaults_to_zero() {
        assert_eq!(AgentResponse::failure("x").tools_used(), 0);

        let mut metadata = Map::new();
        metadata.insert("tools_used".to_string(), Value::from(3));
        assert_eq!(AgentResponse::ok("done", metadata).tools_used(), 3);
    }

    #[test]
    fn test_agents_from_config_route_by_kind() {
        let agents = Agents::from_config(&AgentConfig::default());
        assert_eq!(agents.get(AgentKind::Chat).kind(), AgentKind::Chat);
        assert_eq!(agents.get(AgentKind::Search).kind(), AgentKind::Search);
        assert!(!agents.chat().capabilities().is_empty());
        assert!(!agents.search().capabilities().is_empty());
    }
}
