//! `web_search` tool backed by the Tavily search API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::llm::ToolDefinition;

pub const TOOL_NAME: &str = "web_search";

/// Maximum number of search results
const SEARCH_RESULTS_MAX: u32 = 10;

/// Default number of search results
pub const SEARCH_RESULTS_DEFAULT: u32 = 5;

const API_TIMEOUT_SECONDS: u64 = 15;

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: "Search the web. Returns relevant pages with titles, URLs and content snippets."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (max: 10)",
                    "minimum": 1,
                    "maximum": SEARCH_RESULTS_MAX
                }
            },
            "required": ["query"]
        }),
    }
}

/// Validated arguments of one `web_search` call.
#[derive(Debug, PartialEq)]
pub struct SearchArgs {
    pub query: String,
    pub num_results: u32,
}

impl SearchArgs {
    /// `default_results` applies when the model leaves `num_results` out.
    pub fn parse(input: &Value, default_results: u32) -> Result<Self, String> {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q.trim().to_string(),
            Some(_) => return Err("query cannot be empty".to_string()),
            None => return Err("missing required parameter 'query'".to_string()),
        };

        let num_results = input
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n.clamp(1, u64::from(SEARCH_RESULTS_MAX)) as u32)
            .unwrap_or_else(|| default_results.clamp(1, SEARCH_RESULTS_MAX));

        Ok(Self { query, num_results })
    }
}

pub async fn search(
    endpoint: &str,
    api_key: &str,
    args: &SearchArgs,
) -> Result<Vec<SearchHit>, String> {
    let request = TavilySearchRequest {
        api_key,
        query: &args.query,
        max_results: args.num_results,
    };

    let response = crate::http::shared_client()
        .post(endpoint)
        .timeout(Duration::from_secs(API_TIMEOUT_SECONDS))
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                format!("Search request timed out after {}s", API_TIMEOUT_SECONDS)
            } else {
                format!("Search request failed: {}", e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Search API returned {}: {}", status, body));
    }

    let data: TavilySearchResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse search response: {}", e))?;
    Ok(data.results)
}

/// Render hits as the tool result text handed back to the model.
pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for \"{}\".", query);
    }
    let mut out = format!("Search results for \"{}\":\n", query);
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n   {}\n", i + 1, hit.title, hit.url, hit.content));
    }
    out
}
