use std::env;

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";

/// Settings shared by the chat and search agents.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub search_api_key: Option<String>,
    pub search_endpoint: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            max_tokens: 2048,
            search_api_key: None,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: get("LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            endpoint: get("LLM_ENDPOINT").unwrap_or(defaults.endpoint),
            model: get("LLM_MODEL").unwrap_or(defaults.model),
            max_tokens: get("LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            search_api_key: get("TAVILY_API_KEY"),
            search_endpoint: get("TAVILY_ENDPOINT").unwrap_or(defaults.search_endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_key_is_a_fallback() {
        let config = AgentConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.endpoint, DEFAULT_LLM_ENDPOINT);
        assert_eq!(config.search_endpoint, DEFAULT_SEARCH_ENDPOINT);

        let config = AgentConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".to_string()),
            "LLM_API_KEY" => Some("sk-llm".to_string()),
            "LLM_MODEL" => Some("llama3.3".to_string()),
            "TAVILY_ENDPOINT" => Some("http://127.0.0.1:9000/search".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-llm"));
        assert_eq!(config.model, "llama3.3");
        assert_eq!(config.search_endpoint, "http://127.0.0.1:9000/search");
    }
}
