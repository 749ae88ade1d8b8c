//! Stock change log entry
//!
//! Every stock mutation appends one of these records. Entries are
//! append-only: never mutated, never deleted. They exist for
//! reconciliation and debugging, not for automatic replay.

use serde::{Deserialize, Serialize};

/// Kind of stock mutation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    /// Units reserved for an order
    Decrement,
    /// Units added outside the order flow (restock)
    Increment,
    /// Compensating restoration of a prior decrement
    Restore,
}

/// One immutable audit record of a stock mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangeEntry {
    pub product_id: String,
    pub operation: StockOperation,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    /// Order that triggered the mutation; empty for increments, which
    /// are not tied to an order
    pub order_id: String,
    /// Epoch millis
    pub timestamp: i64,
}
