use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use coffee_shop_types::{HealthStatus, MenuItem, ShopInfo};

use super::AppState;
use crate::error::{internal, ApiError};
use crate::store::{from_document, Filter, MENU};

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const MENU_LIMIT: usize = 100;

// GET /api/
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello World" }))
}

// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        storage: state.store.backend_name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// GET /api/info
pub async fn info() -> Json<ShopInfo> {
    Json(shop_info())
}

pub fn shop_info() -> ShopInfo {
    ShopInfo {
        name: "Black Coffee Terminal".to_string(),
        description: "Premium black coffee only. No cream, no sugar, no compromises.".to_string(),
        location: "123 Terminal Street, Code City".to_string(),
        hours: "Mon-Fri: 6:00 AM - 8:00 PM, Sat-Sun: 7:00 AM - 6:00 PM".to_string(),
        philosophy: "We believe in the pure, unadulterated taste of quality coffee beans. \
                     Each cup is carefully selected and roasted to perfection."
            .to_string(),
        commands: [
            "menu - View our coffee selection",
            "info - Learn about our shop",
            "order <coffee_name> - Place an order",
            "help - Show available commands",
            "clear - Clear the terminal",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

// GET /api/menu
pub async fn menu(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let docs = state
        .store
        .collection(MENU)
        .find(Filter::all().eq("available", true))
        .to_list(Some(MENU_LIMIT))
        .map_err(internal("Failed to fetch menu"))?;

    let items = docs
        .into_iter()
        .map(from_document::<MenuItem>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(internal("Failed to fetch menu"))?;
    Ok(Json(items))
}
