//! Shared utilities: error types, response envelope and logging setup.

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult};
