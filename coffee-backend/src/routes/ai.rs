use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use coffee_shop_types::{
    AgentCapabilities, CapabilitiesResponse, ChatRequest, ChatResponse, SearchRequest,
    SearchResponse,
};

use super::AppState;
use crate::agents::AgentKind;
use crate::error::ApiError;

const MAX_SEARCH_RESULTS: u32 = 10;

fn search_prompt(query: &str) -> String {
    format!(
        "Search for information about: {}. Provide a comprehensive summary with key findings.",
        query
    )
}

// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    if request.message.trim().is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }

    let kind: AgentKind = match request.agent_type.parse() {
        Ok(kind) => kind,
        Err(e) => {
            log::warn!("[CHAT] {}", e);
            return Ok(Json(ChatResponse::failed(request.agent_type, e)));
        }
    };

    let agent = state.agents.get(kind);
    log::info!("[CHAT] {} agent <- {} chars", agent.kind(), request.message.len());
    // Only the search agent has tools to offer.
    let result = agent
        .execute(&request.message, kind == AgentKind::Search)
        .await;
    if let Some(e) = &result.error {
        log::error!("[CHAT] {} agent failed: {}", kind, e);
    }

    Ok(Json(ChatResponse {
        success: result.success,
        response: result.content,
        agent_type: request.agent_type,
        capabilities: agent.capabilities(),
        metadata: result.metadata,
        error: result.error,
    }))
}

// POST /api/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body?;
    if request.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }
    if request.max_results < 1 || request.max_results > MAX_SEARCH_RESULTS {
        return Err(ApiError::validation(format!(
            "max_results must be between 1 and {}",
            MAX_SEARCH_RESULTS
        )));
    }

    log::info!("[SEARCH] '{}'", request.query);
    let result = state
        .agents
        .search()
        .execute_with_limit(&search_prompt(&request.query), true, request.max_results)
        .await;

    if !result.success {
        let error = result.error.unwrap_or_else(|| "Search failed".to_string());
        log::error!("[SEARCH] '{}' failed: {}", request.query, error);
        return Ok(Json(SearchResponse::failed(request.query, error)));
    }

    let sources_count = result.tools_used();
    Ok(Json(SearchResponse {
        success: true,
        query: request.query,
        summary: result.content,
        search_results: Some(result.metadata),
        sources_count,
        error: None,
    }))
}

// GET /api/agents/capabilities
pub async fn capabilities(State(state): State<Arc<AppState>>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        success: true,
        capabilities: AgentCapabilities {
            search_agent: state.agents.search().capabilities(),
            chat_agent: state.agents.chat().capabilities(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::agents::mock::MockAgent;
    use crate::agents::Agents;
    use crate::routes::test_support::{seeded_state, send};
    use crate::store::Store;

    fn state_with_agents(chat: Arc<MockAgent>, search: Arc<MockAgent>) -> Arc<AppState> {
        Arc::new(AppState::new(Store::in_memory(), Agents::new(chat, search)))
    }

    #[test]
    fn test_search_prompt() {
        assert_eq!(
            search_prompt("geisha"),
            "Search for information about: geisha. Provide a comprehensive summary with key findings."
        );
    }

    #[tokio::test]
    async fn test_chat_defaults_to_chat_agent() {
        let (status, body) =
            send(&seeded_state(), "POST", "/api/chat", Some(json!({"message": "hi"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["response"], "Hello from chat");
        assert_eq!(body["agent_type"], "chat");
        assert_eq!(body["capabilities"], json!(["mock chat"]));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_chat_routes_to_search_agent_with_tools() {
        let chat = Arc::new(MockAgent::replying(AgentKind::Chat, "chat", 0));
        let search = Arc::new(MockAgent::replying(AgentKind::Search, "found it", 2));
        let state = state_with_agents(chat.clone(), search.clone());

        let (status, body) = send(
            &state,
            "POST",
            "/api/chat",
            Some(json!({"message": "latest harvest?", "agent_type": "search", "context": {"k": 1}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "found it");
        assert_eq!(body["metadata"]["tools_used"], 2);
        assert!(chat.calls.lock().is_empty());
        assert_eq!(
            *search.calls.lock(),
            vec![("latest harvest?".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_chat_unknown_agent_type() {
        let (status, body) = send(
            &seeded_state(),
            "POST",
            "/api/chat",
            Some(json!({"message": "hi", "agent_type": "barista"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["agent_type"], "barista");
        assert_eq!(body["error"], "Unknown agent type: barista");
    }

    #[tokio::test]
    async fn test_chat_agent_type_is_case_sensitive() {
        let chat = Arc::new(MockAgent::replying(AgentKind::Chat, "chat", 0));
        let search = Arc::new(MockAgent::replying(AgentKind::Search, "found it", 2));
        let state = state_with_agents(chat.clone(), search.clone());

        let (status, body) = send(
            &state,
            "POST",
            "/api/chat",
            Some(json!({"message": "hi", "agent_type": "Search"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["agent_type"], "Search");
        assert_eq!(body["error"], "Unknown agent type: Search");
        assert!(chat.calls.lock().is_empty());
        assert!(search.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_chat_agent_failure_is_reported() {
        let chat = Arc::new(MockAgent::failing(AgentKind::Chat, "LLM API key not configured"));
        let search = Arc::new(MockAgent::replying(AgentKind::Search, "x", 0));
        let state = state_with_agents(chat, search);

        let (status, body) = send(&state, "POST", "/api/chat", Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["response"], "");
        assert_eq!(body["error"], "LLM API key not configured");
    }

    #[tokio::test]
    async fn test_chat_validation() {
        let state = seeded_state();
        for body in [json!({"message": "   "}), json!({"agent_type": "chat"})] {
            let (status, _) = send(&state, "POST", "/api/chat", Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn test_search_success() {
        let chat = Arc::new(MockAgent::replying(AgentKind::Chat, "x", 0));
        let search = Arc::new(MockAgent::replying(AgentKind::Search, "Summary", 3));
        let state = state_with_agents(chat, search.clone());

        let (status, body) = send(
            &state,
            "POST",
            "/api/search",
            Some(json!({"query": "coffee trends", "max_results": 3})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["query"], "coffee trends");
        assert_eq!(body["summary"], "Summary");
        assert_eq!(body["sources_count"], 3);
        assert_eq!(body["search_results"]["tools_used"], 3);

        let calls = search.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (search_prompt("coffee trends"), true));
        assert_eq!(*search.limits.lock(), vec![3]);
    }

    #[tokio::test]
    async fn test_search_failure() {
        let chat = Arc::new(MockAgent::replying(AgentKind::Chat, "x", 0));
        let search = Arc::new(MockAgent::failing(AgentKind::Search, "upstream timeout"));
        let state = state_with_agents(chat, search);

        let (status, body) =
            send(&state, "POST", "/api/search", Some(json!({"query": "coffee"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["summary"], "");
        assert_eq!(body["sources_count"], 0);
        assert_eq!(body["error"], "upstream timeout");
        assert!(body.get("search_results").is_none());
    }

    #[tokio::test]
    async fn test_search_validation() {
        let state = seeded_state();
        for body in [
            json!({"query": ""}),
            json!({"query": "x", "max_results": 0}),
            json!({"query": "x", "max_results": 11}),
        ] {
            let (status, _) = send(&state, "POST", "/api/search", Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "body {}", body);
        }
    }

    #[tokio::test]
    async fn test_capabilities() {
        let (status, body) = send(&seeded_state(), "GET", "/api/agents/capabilities", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["capabilities"]["chat_agent"], json!(["mock chat"]));
        assert_eq!(body["capabilities"]["search_agent"], json!(["mock search"]));
    }
}
