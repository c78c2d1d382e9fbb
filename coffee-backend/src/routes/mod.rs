//! Axum router and shared state for the `/api` surface.

pub mod ai;
pub mod orders;
pub mod shop;
pub mod status;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::agents::Agents;
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub agents: Agents,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, agents: Agents) -> Self {
        Self {
            store,
            agents,
            start_time: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(shop::root))
        .route("/api/health", get(shop::health))
        .route("/api/info", get(shop::info))
        .route("/api/menu", get(shop::menu))
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/:order_id", get(orders::get_order))
        .route(
            "/api/status",
            post(status::create_status_check).get(status::list_status_checks),
        )
        .route("/api/chat", post(ai::chat))
        .route("/api/search", post(ai::search))
        .route("/api/agents/capabilities", get(ai::capabilities))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
