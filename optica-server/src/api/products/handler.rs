//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::dto::{CreateProductRequest, FieldViolation, RestockRequest};
use shared::models::{Product, StockChangeEntry};
use shared::util;

/// Create a product
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let mut violations = Vec::new();
    if payload.name.is_empty() {
        violations.push(FieldViolation::new("name", "required", "name is required"));
    }
    if !payload.sell_price.is_finite() || payload.sell_price < 0.0 {
        violations.push(FieldViolation::new(
            "sellPrice",
            "out_of_range",
            "sellPrice must be a non-negative number",
        ));
    }
    if payload.stock < 0 {
        violations.push(FieldViolation::new(
            "stock",
            "out_of_range",
            "stock must not be negative",
        ));
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let product = Product {
        id: util::new_id(),
        name: payload.name,
        brand: payload.brand,
        sell_price: payload.sell_price,
        stock: payload.stock,
        kind: payload.kind,
        is_deleted: false,
        created_at: util::now_millis(),
    };
    state.ledger.put_product(&product)?;

    tracing::info!(product_id = %product.id, stock = product.stock, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// List all non-deleted products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.ledger.list_products()?;
    Ok(Json(products))
}

/// Get product by id, including its current stock
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = state
        .ledger
        .get_product(&id)?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("product not found: {id}")))?;
    Ok(Json(product))
}

/// Add units outside the order flow (supplier delivery, correction)
pub async fn restock(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<Product>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(vec![FieldViolation::new(
            "quantity",
            "out_of_range",
            "quantity must be a positive number",
        )]));
    }
    let reason = payload.reason.as_deref().unwrap_or("restock");
    let product = state.coordinator.restock(&id, payload.quantity, reason)?;
    Ok(Json(product))
}

/// Stock change log for a product, most-recent-first
pub async fn stock_history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<StockChangeEntry>>> {
    if state.ledger.get_product(&id)?.is_none() {
        return Err(AppError::NotFound(format!("product not found: {id}")));
    }
    let entries = state.ledger.stock_history(&id)?;
    Ok(Json(entries))
}
