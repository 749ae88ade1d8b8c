//! Product API Module
//!
//! Read access to the catalog, restocking, and the stock history used
//! by operational tooling to reconcile discrepancies. All stock
//! movement goes through the coordinator, restocks included.
//!
//! # Routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/products | POST | Create a product |
//! | /api/products | GET | List non-deleted products |
//! | /api/products/{id} | GET | Product detail with current stock |
//! | /api/products/{id}/restock | POST | Add units outside the order flow |
//! | /api/products/{id}/stock-history | GET | Change log, most-recent-first |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Product router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/restock", post(handler::restock))
        .route("/{id}/stock-history", get(handler::stock_history))
}
