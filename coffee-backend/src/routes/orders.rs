use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use coffee_shop_types::{MenuItem, Order, OrderCreate};

use super::AppState;
use crate::error::{internal, ApiError};
use crate::store::{from_document, to_document, Filter, MENU, ORDERS};

fn validate(request: &OrderCreate) -> Result<(), ApiError> {
    if request.customer_name.trim().is_empty() {
        return Err(ApiError::validation("customer_name must not be empty"));
    }
    if request.coffee_id.trim().is_empty() {
        return Err(ApiError::validation("coffee_id must not be empty"));
    }
    if request.quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    Ok(())
}

// POST /api/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    body: Result<Json<OrderCreate>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Json(request) = body?;
    validate(&request)?;

    let item = state
        .store
        .collection(MENU)
        .find_one(&Filter::all().eq("id", request.coffee_id.as_str()).eq("available", true))
        .map_err(internal("Failed to create order"))?
        .ok_or_else(|| ApiError::not_found("Coffee item not found or unavailable"))?;
    let item: MenuItem = from_document(item).map_err(internal("Failed to create order"))?;

    let order = Order::place(&request, &item);
    let doc = to_document(&order).map_err(internal("Failed to create order"))?;
    state
        .store
        .collection(ORDERS)
        .insert_one(doc)
        .map_err(internal("Failed to create order"))?;

    log::info!(
        "Order {} placed: {} x{} for {} ({:.2})",
        order.id,
        order.coffee_name,
        order.quantity,
        order.customer_name,
        order.total_price
    );
    Ok(Json(order))
}

// GET /api/orders/:order_id
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let doc = state
        .store
        .collection(ORDERS)
        .find_one(&Filter::all().eq("id", order_id))
        .map_err(internal("Failed to fetch order"))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let order = from_document(doc).map_err(internal("Failed to fetch order"))?;
    Ok(Json(order))
}
