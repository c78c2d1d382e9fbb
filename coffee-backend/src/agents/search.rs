use async_trait::async_trait;
use serde_json::{Map, Value};

use super::chat::build_client;
use super::llm::{ChatMessage, LlmClient, ToolCall, ToolDefinition};
use super::web_search::{self, SearchArgs, SEARCH_RESULTS_DEFAULT};
use super::{Agent, AgentConfig, AgentKind, AgentResponse};

const SYSTEM_PROMPT: &str = "You are a research assistant. Use the web_search tool to find \
current information, then write a well-organised summary of the key findings and cite the \
URLs you relied on.";

/// Model turns per execution, tool rounds included.
const MAX_ITERATIONS: usize = 5;

pub struct SearchAgent {
    client: Result<LlmClient, String>,
    search_api_key: Option<String>,
    search_endpoint: String,
}

/// Running totals of one tool loop.
#[derive(Debug, Default)]
struct ToolLog {
    tools_used: u64,
    sources: Vec<String>,
}

impl ToolLog {
    fn record(&mut self, urls: impl IntoIterator<Item = String>) {
        self.tools_used += 1;
        for url in urls {
            if !self.sources.contains(&url) {
                self.sources.push(url);
            }
        }
    }
}

impl SearchAgent {
    pub fn new(config: &AgentConfig) -> Self {
        let client = build_client(config);
        if let Err(e) = &client {
            log::warn!("Search agent unavailable: {}", e);
        }
        if config.search_api_key.is_none() {
            log::warn!("TAVILY_API_KEY not set, web_search tool calls will fail");
        }
        Self {
            client,
            search_api_key: config.search_api_key.clone(),
            search_endpoint: config.search_endpoint.clone(),
        }
    }

    async fn run_tool(&self, call: &ToolCall, default_results: u32, tally: &mut ToolLog) -> String {
        if call.name != web_search::TOOL_NAME {
            return format!("Error: unknown tool '{}'", call.name);
        }
        let args = match SearchArgs::parse(&call.arguments, default_results) {
            Ok(args) => args,
            Err(e) => return format!("Error: {}", e),
        };
        let Some(api_key) = self.search_api_key.as_deref() else {
            return "Error: web search is not configured (TAVILY_API_KEY not set)".to_string();
        };

        log::info!("[SEARCH] web_search '{}' ({} results)", args.query, args.num_results);
        match web_search::search(&self.search_endpoint, api_key, &args).await {
            Ok(hits) => {
                tally.record(hits.iter().map(|h| h.url.clone()));
                web_search::format_results(&args.query, &hits)
            }
            Err(e) => {
                log::warn!("[SEARCH] web_search failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    async fn run(&self, prompt: &str, use_tools: bool, default_results: u32) -> AgentResponse {
        let client = match &self.client {
            Ok(c) => c,
            Err(e) => return AgentResponse::failure(e.clone()),
        };

        let tools = if use_tools {
            vec![web_search::definition()]
        } else {
            vec![]
        };
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let mut tally = ToolLog::default();

        for iteration in 1..=MAX_ITERATIONS {
            // The last turn gets no tools, so the model has to answer.
            let offered: &[ToolDefinition] = if iteration == MAX_ITERATIONS {
                &[]
            } else {
                &tools[..]
            };
            let response = match client.generate(&messages, offered).await {
                Ok(r) => r,
                Err(e) => {
                    log::error!("Search agent failed on iteration {}: {}", iteration, e);
                    return AgentResponse::failure(e);
                }
            };

            log::debug!(
                "[SEARCH] turn {} stop_reason={:?} tool_calls={}",
                iteration,
                response.stop_reason,
                response.tool_calls.len()
            );
            if !response.has_tool_calls() {
                if response.content.is_empty() {
                    return AgentResponse::failure("LLM API returned no content");
                }
                return AgentResponse::ok(response.content, metadata(client.model(), tally, iteration));
            }
            if iteration == MAX_ITERATIONS {
                break;
            }

            messages.push(ChatMessage::assistant_tool_calls(
                &response.content,
                &response.tool_calls,
            ));
            for call in &response.tool_calls {
                let result = self.run_tool(call, default_results, &mut tally).await;
                messages.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        AgentResponse::failure(format!(
            "Search did not finish within {} model turns",
            MAX_ITERATIONS
        ))
    }
}

fn metadata(model: &str, tally: ToolLog, iterations: usize) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("agent_type".to_string(), Value::from("search"));
    metadata.insert("model".to_string(), Value::from(model));
    metadata.insert("tools_used".to_string(), Value::from(tally.tools_used));
    metadata.insert("iterations".to_string(), Value::from(iterations));
    metadata.insert("sources".to_string(), Value::from(tally.sources));
    metadata
}

#[async_trait]
impl Agent for SearchAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Search
    }

    async fn execute(&self, prompt: &str, use_tools: bool) -> AgentResponse {
        self.run(prompt, use_tools, SEARCH_RESULTS_DEFAULT).await
    }

    async fn execute_with_limit(
        &self,
        prompt: &str,
        use_tools: bool,
        max_results: u32,
    ) -> AgentResponse {
        self.run(prompt, use_tools, max_results).await
    }

    fn capabilities(&self) -> Vec<String> {
        [
            "Web search",
            "Information retrieval",
            "Source summarization",
            "Fact finding",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
