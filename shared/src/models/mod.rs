//! Domain models
//!
//! Order aggregate, product catalog entries and the stock change log.

pub mod order;
pub mod prescription;
pub mod product;
pub mod stock;

// Re-exports
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus};
pub use prescription::{EyeMeasure, FrameMeasurements, PrescriptionData};
pub use product::{Product, ProductKind};
pub use stock::{StockChangeEntry, StockOperation};
