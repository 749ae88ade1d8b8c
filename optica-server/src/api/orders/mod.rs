//! Order API Module
//!
//! All mutations go through [`crate::orders::OrdersManager`], which is
//! the only caller of the stock reservation coordinator.
//!
//! # Routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/orders | POST | Create an order (reserves stock) |
//! | /api/orders | GET | List orders |
//! | /api/orders/{id} | GET | Order detail |
//! | /api/orders/{id} | PUT | Partial update of mutable fields |
//! | /api/orders/{id} | DELETE | Soft delete |
//! | /api/orders/{id}/status | PUT | Lifecycle transition |
//! | /api/orders/{id}/payment | PUT | Payment transition |
//! | /api/orders/{id}/laboratory | PUT | Laboratory assignment |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::remove),
        )
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/payment", put(handler::update_payment))
        .route("/{id}/laboratory", put(handler::update_laboratory))
}
