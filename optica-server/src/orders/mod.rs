//! Order pipeline: validation, pricing, persistence and lifecycle
//! transitions, orchestrated by [`OrdersManager`].

pub mod manager;
pub mod pricing;
pub mod repository;
pub mod validate;

pub use manager::{OrderError, OrdersManager};
pub use repository::OrderRepository;
