//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::dto::{
    CreateOrderRequest, UpdateLaboratoryRequest, UpdateOrderRequest, UpdatePaymentRequest,
    UpdateStatusRequest,
};
use shared::models::Order;

/// Create an order
///
/// Runs the full pipeline: validation, pricing, stock reservation,
/// persistence. `201` on success, `400` with field violations, `409`
/// when a product cannot satisfy its requested quantity.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create_order(&payload)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list_orders()?;
    Ok(Json(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&id)?;
    Ok(Json(order))
}

/// Partial update of an order's mutable fields
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.apply_patch(&id, &payload)?;
    Ok(Json(order))
}

/// Soft-delete an order
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.orders.delete_order(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move the order through its lifecycle state machine
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.update_status(&id, payload.status)?;
    Ok(Json(order))
}

/// Update payment status and optionally the received amount
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.update_payment(&id, &payload)?;
    Ok(Json(order))
}

/// Assign or clear the laboratory; never touches stock
pub async fn update_laboratory(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLaboratoryRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.set_laboratory(&id, payload.laboratory_id)?;
    Ok(Json(order))
}
