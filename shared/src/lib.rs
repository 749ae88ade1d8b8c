//! Shared types for the Optica back office
//!
//! Common types used by the server and its clients: domain models
//! (orders, products, prescriptions), the stock change log entry,
//! request/response DTOs and utility helpers.

pub mod dto;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Order, OrderStatus, PaymentMethod, PaymentStatus, Product, ProductKind, StockChangeEntry,
    StockOperation,
};
