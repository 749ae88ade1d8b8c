//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`orders`] - order creation and lifecycle transitions
//! - [`products`] - product catalog and stock history

pub mod health;
pub mod orders;
pub mod products;

use crate::core::ServerState;
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResponse, AppResult};

/// HTTP request log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the full application router
pub fn router(state: ServerState) -> Router {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(products::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
}
