use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use coffee_shop_types::{StatusCheck, StatusCheckCreate};

use super::AppState;
use crate::error::{internal, ApiError};
use crate::store::{from_document, to_document, Filter, STATUS_CHECKS};

const STATUS_LIST_LIMIT: usize = 1000;

// POST /api/status
pub async fn create_status_check(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>, ApiError> {
    let Json(request) = body?;
    if request.client_name.trim().is_empty() {
        return Err(ApiError::validation("client_name must not be empty"));
    }

    let check = StatusCheck::new(request.client_name);
    let doc = to_document(&check).map_err(internal("Failed to create status check"))?;
    state
        .store
        .collection(STATUS_CHECKS)
        .insert_one(doc)
        .map_err(internal("Failed to create status check"))?;

    log::debug!("Status check {} from {}", check.id, check.client_name);
    Ok(Json(check))
}

// GET /api/status
pub async fn list_status_checks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    let docs = state
        .store
        .collection(STATUS_CHECKS)
        .find(Filter::all())
        .to_list(Some(STATUS_LIST_LIMIT))
        .map_err(internal("Failed to fetch status checks"))?;

    let checks = docs
        .into_iter()
        .map(from_document::<StatusCheck>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(internal("Failed to fetch status checks"))?;
    Ok(Json(checks))
}
