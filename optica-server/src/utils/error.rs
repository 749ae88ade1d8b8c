//! Unified error handling
//!
//! Application-level error type and the API response envelope:
//! - [`AppError`] - application error enum
//! - [`AppResponse`] - API response structure
//!
//! # Error code scheme
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx | Generic request errors | E0003 not found |
//! | E1xxx | Validation / pricing | E1001 validation failed |
//! | E2xxx | Stock errors | E2001 insufficient stock |
//! | E5xxx | Transaction errors | E5001 retry budget exhausted |
//! | E9xxx | System errors | E9002 storage error |
//!
//! # Usage
//!
//! ```ignore
//! Err(AppError::NotFound("order not found".to_string()))
//! ```

use crate::orders::OrderError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::dto::FieldViolation;
use tracing::error;

/// Unified API response envelope
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Error code (E0000 means success)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Field-level violations for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
    /// Structured detail for stock errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub type AppResult<T> = Result<T, AppError>;

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Request errors (4xx) ==========
    #[error("Resource not found: {0}")]
    /// Unknown resource (404)
    NotFound(String),

    #[error("Validation failed")]
    /// Rule-violating input, carries field-level violations (400)
    Validation(Vec<FieldViolation>),

    #[error("Invalid transition: {0}")]
    /// State machine rejection (400)
    InvalidTransition(String),

    #[error("Insufficient stock for product {product_id}")]
    /// A named product cannot satisfy the requested quantity (409)
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    // ========== System errors (5xx) ==========
    #[error("Transaction failed: {0}")]
    /// Storage transaction exhausted its retry budget (503)
    Transaction(String),

    #[error("Database error: {0}")]
    /// Storage failure (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// Everything else (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, errors, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg, None, None),

            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                "E1001",
                "Validation failed".to_string(),
                Some(violations),
                None,
            ),

            AppError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, "E1003", msg, None, None),

            AppError::InsufficientStock {
                product_id,
                available,
                requested,
            } => (
                StatusCode::CONFLICT,
                "E2001",
                format!("Insufficient stock for product {product_id}"),
                None,
                Some(serde_json::json!({
                    "productId": product_id,
                    "available": available,
                    "requested": requested,
                })),
            ),

            AppError::Transaction(msg) => {
                error!(target: "transaction", error = %msg, "Transaction error occurred");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "E5001",
                    "Transaction failed, please retry".to_string(),
                    None,
                    None,
                )
            }

            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                    None,
                    None,
                )
            }

            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
            errors,
            details,
        });

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(violations) => AppError::Validation(violations),
            OrderError::Pricing(e) => AppError::Validation(vec![FieldViolation::new(
                "finalPrice",
                "pricing_invariant",
                e.to_string(),
            )]),
            OrderError::NotFound(id) => AppError::NotFound(format!("order not found: {id}")),
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => AppError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            OrderError::InvalidStatusTransition { from, to } => {
                AppError::InvalidTransition(format!("order status {from:?} -> {to:?}"))
            }
            OrderError::InvalidPaymentTransition { from, to } => {
                AppError::InvalidTransition(format!("payment status {from:?} -> {to:?}"))
            }
            OrderError::Transaction(msg) => AppError::Transaction(msg),
            OrderError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<crate::stock::StockError> for AppError {
    fn from(err: crate::stock::StockError) -> Self {
        match err {
            crate::stock::StockError::Insufficient {
                product_id,
                available,
                requested,
            } => AppError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            crate::stock::StockError::ProductNotFound(id) => {
                AppError::NotFound(format!("product not found: {id}"))
            }
            crate::stock::StockError::Transaction { attempts, source } => {
                AppError::Transaction(format!("gave up after {attempts} attempts: {source}"))
            }
            crate::stock::StockError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<crate::db::StoreError> for AppError {
    fn from(err: crate::db::StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_conflict() {
        let response = AppError::InsufficientStock {
            product_id: "prod-1".to_string(),
            available: 0,
            requested: 1,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response =
            AppError::Validation(vec![FieldViolation::new("clientId", "required", "missing")])
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transaction_maps_to_service_unavailable() {
        let response = AppError::Transaction("gave up".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
