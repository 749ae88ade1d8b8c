//! Stock reservation coordinator
//!
//! The only component allowed to mutate product stock. Given the line
//! items of a validated order it decrements every referenced product
//! as a single all-or-nothing unit of work, appending one change-log
//! entry per product. If any product cannot satisfy its requested
//! quantity the whole batch aborts with nothing mutated.
//!
//! # Reservation Flow
//!
//! ```text
//! reserve(token, order_id, product_ids)
//!     ├─ 1. Group line items into (product_id, quantity) pairs
//!     ├─ 2. Begin write transaction (serialized by redb)
//!     ├─ 3. Idempotency check: committed token → return stored receipt
//!     ├─ 4. Sufficiency pass over every pair (abort batch on shortfall)
//!     ├─ 5. Apply all decrements + append change log entries
//!     ├─ 6. Record receipt under the token
//!     └─ 7. Commit
//! ```
//!
//! `restore` is the compensating path: it re-increments every
//! decremented product exactly once, driven by the receipt's
//! `restored` flag, so the ledger reconciles to net zero for orders
//! that never became durable or were cancelled.

use crate::db::{RESERVATION_BY_ORDER_TABLE, RESERVATIONS_TABLE, StoreError};
use crate::stock::StockLedger;
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use shared::models::{Product, StockChangeEntry, StockOperation};
use shared::util::now_millis;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Additional attempts after the first failed transaction
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff between attempts (multiplied by the attempt number)
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// How long a coordinator transaction may wait for the writer lock
/// before aborting with nothing mutated
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Change log reason recorded for reservations
const RESERVATION_REASON: &str = "order_reservation";

/// One grouped reservation line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Committed result of a reservation, keyed by its idempotency token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationReceipt {
    pub token: String,
    pub order_id: String,
    pub lines: Vec<ReservationLine>,
    /// Set once the compensating restoration has run
    pub restored: bool,
    pub created_at: i64,
}

/// Reservation errors
#[derive(Debug, Error)]
pub enum StockError {
    #[error("insufficient stock for product {product_id}: have {available}, requested {requested}")]
    Insufficient {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("stock transaction failed after {attempts} attempts: {source}")]
    Transaction {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Transient storage failure, retried internally
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coordinates atomic multi-product stock reservation
#[derive(Clone, Debug)]
pub struct StockCoordinator {
    ledger: StockLedger,
    max_retries: u32,
    retry_backoff: Duration,
    lock_timeout: Duration,
}

impl StockCoordinator {
    pub fn new(ledger: StockLedger) -> Self {
        Self {
            ledger,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the retry policy (tests)
    pub fn with_retry_policy(mut self, max_retries: u32, retry_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Override the writer lock acquisition deadline (tests)
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Reserve one unit per entry of `product_ids` for `order_id`
    ///
    /// Duplicate ids are grouped into quantities. A token that already
    /// produced a committed reservation is a no-op returning the stored
    /// receipt. Transient storage errors are retried with backoff up to
    /// the configured budget; business failures never are.
    pub fn reserve(
        &self,
        token: &str,
        order_id: &str,
        product_ids: &[String],
    ) -> Result<ReservationReceipt, StockError> {
        let mut pairs: BTreeMap<&str, i64> = BTreeMap::new();
        for id in product_ids {
            *pairs.entry(id.as_str()).or_insert(0) += 1;
        }

        self.run_with_retries("reserve", || self.reserve_once(token, order_id, &pairs))
    }

    /// Compensating restoration for a committed reservation
    ///
    /// Re-increments every decremented product and appends a `restore`
    /// change log entry per product. Returns `false` when there is
    /// nothing to restore (unknown order or already restored), so the
    /// operation is exactly-once.
    pub fn restore(&self, order_id: &str, reason: &str) -> Result<bool, StockError> {
        self.run_with_retries("restore", || self.restore_once(order_id, reason))
    }

    /// Add units outside the order flow (deliveries, corrections)
    ///
    /// Appends one `increment` change log entry. `quantity` must be
    /// positive; callers validate before reaching the coordinator.
    pub fn restock(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
    ) -> Result<Product, StockError> {
        self.run_with_retries("restock", || self.restock_once(product_id, quantity, reason))
    }

    /// Look up the receipt for an order, if any
    pub fn receipt_for_order(&self, order_id: &str) -> Result<Option<ReservationReceipt>, StockError> {
        let read_txn = self.ledger.store().begin_read().map_err(StockError::Store)?;
        let index = read_txn
            .open_table(RESERVATION_BY_ORDER_TABLE)
            .map_err(StoreError::from)?;
        let Some(token) = index.get(order_id).map_err(StoreError::from)? else {
            return Ok(None);
        };
        let receipts = read_txn
            .open_table(RESERVATIONS_TABLE)
            .map_err(StoreError::from)?;
        match receipts.get(token.value()).map_err(StoreError::from)? {
            Some(value) => Ok(Some(
                serde_json::from_slice(value.value()).map_err(StoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    // ========== Internals ==========

    fn run_with_retries<T>(
        &self,
        op: &str,
        mut body: impl FnMut() -> Result<T, StockError>,
    ) -> Result<T, StockError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match body() {
                Ok(value) => return Ok(value),
                Err(StockError::Store(source)) => {
                    if attempts > self.max_retries {
                        tracing::error!(
                            op,
                            attempts,
                            error = %source,
                            "stock transaction retry budget exhausted"
                        );
                        return Err(StockError::Transaction { attempts, source });
                    }
                    tracing::warn!(op, attempts, error = %source, "retrying stock transaction");
                    std::thread::sleep(self.retry_backoff * attempts);
                }
                Err(other) => return Err(other),
            }
        }
    }

    fn reserve_once(
        &self,
        token: &str,
        order_id: &str,
        pairs: &BTreeMap<&str, i64>,
    ) -> Result<ReservationReceipt, StockError> {
        let txn = self
            .ledger
            .store()
            .begin_write_bounded(self.lock_timeout)
            .map_err(StockError::Store)?;

        // Idempotency: a committed token returns its receipt, no mutation.
        // A restored receipt means the enclosing order never became
        // durable, so the token is free to reserve again.
        if let Some(existing) = self.get_receipt_txn(&txn, token)? {
            if !existing.restored {
                tracing::info!(token, order_id = %existing.order_id, "reservation replayed, returning committed receipt");
                return Ok(existing);
            }
        }

        // Sufficiency pass: any shortfall aborts the whole batch before
        // a single decrement is written
        let mut loaded = Vec::with_capacity(pairs.len());
        for (&product_id, &requested) in pairs {
            let product = self
                .ledger
                .get_product_txn(&txn, product_id)
                .map_err(StockError::Store)?
                .filter(|p| !p.is_deleted)
                .ok_or_else(|| StockError::ProductNotFound(product_id.to_string()))?;

            if product.stock < requested {
                return Err(StockError::Insufficient {
                    product_id: product_id.to_string(),
                    available: product.stock,
                    requested,
                });
            }
            loaded.push((product, requested));
        }

        // Apply all decrements and append one log entry per product
        let now = now_millis();
        let mut lines = Vec::with_capacity(loaded.len());
        for (mut product, quantity) in loaded {
            let previous = product.stock;
            product.stock -= quantity;
            self.ledger
                .put_product_txn(&txn, &product)
                .map_err(StockError::Store)?;

            let entry = StockChangeEntry {
                product_id: product.id.clone(),
                operation: StockOperation::Decrement,
                previous_stock: previous,
                new_stock: product.stock,
                reason: RESERVATION_REASON.to_string(),
                order_id: order_id.to_string(),
                timestamp: now,
            };
            // Log failures must not block the decrement commit
            if let Err(e) = self.ledger.append_log_txn(&txn, &entry) {
                tracing::error!(
                    product_id = %product.id,
                    order_id,
                    error = %e,
                    "failed to append stock change log entry"
                );
            }

            lines.push(ReservationLine {
                product_id: product.id,
                quantity,
            });
        }

        let receipt = ReservationReceipt {
            token: token.to_string(),
            order_id: order_id.to_string(),
            lines,
            restored: false,
            created_at: now,
        };
        self.put_receipt_txn(&txn, &receipt)?;

        txn.commit().map_err(StoreError::from)?;
        tracing::info!(order_id, token, lines = receipt.lines.len(), "stock reserved");
        Ok(receipt)
    }

    fn restock_once(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
    ) -> Result<Product, StockError> {
        let txn = self
            .ledger
            .store()
            .begin_write_bounded(self.lock_timeout)
            .map_err(StockError::Store)?;

        let mut product = self
            .ledger
            .get_product_txn(&txn, product_id)
            .map_err(StockError::Store)?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| StockError::ProductNotFound(product_id.to_string()))?;

        let previous = product.stock;
        product.stock += quantity;
        self.ledger
            .put_product_txn(&txn, &product)
            .map_err(StockError::Store)?;

        let entry = StockChangeEntry {
            product_id: product.id.clone(),
            operation: StockOperation::Increment,
            previous_stock: previous,
            new_stock: product.stock,
            reason: reason.to_string(),
            // increments are not tied to an order
            order_id: String::new(),
            timestamp: now_millis(),
        };
        if let Err(e) = self.ledger.append_log_txn(&txn, &entry) {
            tracing::error!(
                product_id = %product.id,
                error = %e,
                "failed to append stock change log entry"
            );
        }

        txn.commit().map_err(StoreError::from)?;
        tracing::info!(product_id, quantity, reason, "stock incremented");
        Ok(product)
    }

    fn restore_once(&self, order_id: &str, reason: &str) -> Result<bool, StockError> {
        let txn = self
            .ledger
            .store()
            .begin_write_bounded(self.lock_timeout)
            .map_err(StockError::Store)?;

        let token = {
            let index = txn
                .open_table(RESERVATION_BY_ORDER_TABLE)
                .map_err(StoreError::from)?;
            match index.get(order_id).map_err(StoreError::from)? {
                Some(value) => value.value().to_string(),
                None => return Ok(false),
            }
        };

        let Some(mut receipt) = self.get_receipt_txn(&txn, &token)? else {
            return Ok(false);
        };
        if receipt.restored {
            tracing::debug!(order_id, "reservation already restored, skipping");
            return Ok(false);
        }

        let now = now_millis();
        for line in &receipt.lines {
            let Some(mut product) = self
                .ledger
                .get_product_txn(&txn, &line.product_id)
                .map_err(StockError::Store)?
            else {
                // Products are never hard-deleted; a hole here means the
                // store is damaged, which the change log must record
                tracing::error!(
                    product_id = %line.product_id,
                    order_id,
                    "product missing during restoration"
                );
                continue;
            };

            let previous = product.stock;
            product.stock += line.quantity;
            self.ledger
                .put_product_txn(&txn, &product)
                .map_err(StockError::Store)?;

            let entry = StockChangeEntry {
                product_id: product.id.clone(),
                operation: StockOperation::Restore,
                previous_stock: previous,
                new_stock: product.stock,
                reason: reason.to_string(),
                order_id: order_id.to_string(),
                timestamp: now,
            };
            if let Err(e) = self.ledger.append_log_txn(&txn, &entry) {
                tracing::error!(
                    product_id = %product.id,
                    order_id,
                    error = %e,
                    "failed to append stock change log entry"
                );
            }
        }

        receipt.restored = true;
        self.put_receipt_txn(&txn, &receipt)?;

        txn.commit().map_err(StoreError::from)?;
        tracing::info!(order_id, reason, "stock restored");
        Ok(true)
    }

    fn get_receipt_txn(
        &self,
        txn: &WriteTransaction,
        token: &str,
    ) -> Result<Option<ReservationReceipt>, StockError> {
        let table = txn.open_table(RESERVATIONS_TABLE).map_err(StoreError::from)?;
        match table.get(token).map_err(StoreError::from)? {
            Some(value) => Ok(Some(
                serde_json::from_slice(value.value()).map_err(StoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn put_receipt_txn(
        &self,
        txn: &WriteTransaction,
        receipt: &ReservationReceipt,
    ) -> Result<(), StockError> {
        {
            let mut table = txn.open_table(RESERVATIONS_TABLE).map_err(StoreError::from)?;
            let value = serde_json::to_vec(receipt).map_err(StoreError::from)?;
            table
                .insert(receipt.token.as_str(), value.as_slice())
                .map_err(StoreError::from)?;
        }
        let mut index = txn
            .open_table(RESERVATION_BY_ORDER_TABLE)
            .map_err(StoreError::from)?;
        index
            .insert(receipt.order_id.as_str(), receipt.token.as_str())
            .map_err(StoreError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use shared::models::{Product, ProductKind};

    fn setup() -> (StockLedger, StockCoordinator) {
        let ledger = StockLedger::new(Store::open_in_memory().unwrap());
        let coordinator = StockCoordinator::new(ledger.clone());
        (ledger, coordinator)
    }

    fn seed(ledger: &StockLedger, id: &str, stock: i64) {
        ledger
            .put_product(&Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                brand: None,
                sell_price: 100.0,
                stock,
                kind: ProductKind::CleanLenses {},
                is_deleted: false,
                created_at: now_millis(),
            })
            .unwrap();
    }

    fn stock_of(ledger: &StockLedger, id: &str) -> i64 {
        ledger.get_product(id).unwrap().unwrap().stock
    }

    #[test]
    fn test_reserve_decrements_and_logs() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);

        let receipt = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string(), "lens-a".to_string()])
            .unwrap();

        assert_eq!(receipt.lines, vec![ReservationLine {
            product_id: "lens-a".to_string(),
            quantity: 2,
        }]);
        assert_eq!(stock_of(&ledger, "lens-a"), 3);

        let history = ledger.stock_history("lens-a").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].operation, StockOperation::Decrement);
        assert_eq!(history[0].previous_stock, 5);
        assert_eq!(history[0].new_stock, 3);
        assert_eq!(history[0].order_id, "order-1");
    }

    #[test]
    fn test_shortfall_aborts_whole_batch() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "frame-a", 10);
        seed(&ledger, "frame-b", 1);
        seed(&ledger, "frame-c", 10);

        let items = vec![
            "frame-a".to_string(),
            "frame-b".to_string(),
            "frame-b".to_string(), // needs 2, only 1 available
            "frame-c".to_string(),
        ];
        let err = coordinator.reserve("tok-1", "order-1", &items).unwrap_err();
        match err {
            StockError::Insufficient {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, "frame-b");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // No product mutated, no log entries written
        assert_eq!(stock_of(&ledger, "frame-a"), 10);
        assert_eq!(stock_of(&ledger, "frame-b"), 1);
        assert_eq!(stock_of(&ledger, "frame-c"), 10);
        assert!(ledger.stock_history("frame-a").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_product_aborts_batch() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);

        let items = vec!["lens-a".to_string(), "ghost".to_string()];
        let err = coordinator.reserve("tok-1", "order-1", &items).unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound(id) if id == "ghost"));
        assert_eq!(stock_of(&ledger, "lens-a"), 5);
    }

    #[test]
    fn test_deleted_product_is_not_reservable() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);
        let mut product = ledger.get_product("lens-a").unwrap().unwrap();
        product.is_deleted = true;
        ledger.put_product(&product).unwrap();

        let err = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound(_)));
    }

    #[test]
    fn test_replay_same_token_is_noop() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);

        let first = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap();
        assert_eq!(stock_of(&ledger, "lens-a"), 4);

        let replay = coordinator
            .reserve("tok-1", "order-ignored", &["lens-a".to_string()])
            .unwrap();
        assert_eq!(replay.order_id, first.order_id);
        assert_eq!(replay.lines, first.lines);
        // no second decrement
        assert_eq!(stock_of(&ledger, "lens-a"), 4);
        assert_eq!(ledger.stock_history("lens-a").unwrap().len(), 1);

        let stored = coordinator.receipt_for_order("order-1").unwrap().unwrap();
        assert_eq!(stored.token, "tok-1");
        assert!(!stored.restored);
    }

    #[test]
    fn test_restore_is_exactly_once() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);

        coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string(), "lens-a".to_string()])
            .unwrap();
        assert_eq!(stock_of(&ledger, "lens-a"), 3);

        assert!(coordinator.restore("order-1", "order_cancelled").unwrap());
        assert_eq!(stock_of(&ledger, "lens-a"), 5);

        // second restoration is a no-op
        assert!(!coordinator.restore("order-1", "order_cancelled").unwrap());
        assert_eq!(stock_of(&ledger, "lens-a"), 5);

        // ledger shows a matching decrement/restore pair
        let history = ledger.stock_history("lens-a").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].operation, StockOperation::Restore);
        assert_eq!(history[1].operation, StockOperation::Decrement);
    }

    #[test]
    fn test_token_reserves_again_after_restoration() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);

        coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap();
        assert!(coordinator.restore("order-1", "order_persist_failed").unwrap());
        assert_eq!(stock_of(&ledger, "lens-a"), 5);

        // spent token behaves like a fresh one
        let receipt = coordinator
            .reserve("tok-1", "order-2", &["lens-a".to_string()])
            .unwrap();
        assert_eq!(receipt.order_id, "order-2");
        assert!(!receipt.restored);
        assert_eq!(stock_of(&ledger, "lens-a"), 4);
    }

    #[test]
    fn test_restore_unknown_order_is_noop() {
        let (_ledger, coordinator) = setup();
        assert!(!coordinator.restore("nope", "order_cancelled").unwrap());
    }

    #[test]
    fn test_restock_increments_and_logs() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 2);

        let product = coordinator.restock("lens-a", 5, "supplier_delivery").unwrap();
        assert_eq!(product.stock, 7);
        assert_eq!(stock_of(&ledger, "lens-a"), 7);

        let history = ledger.stock_history("lens-a").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].operation, StockOperation::Increment);
        assert_eq!(history[0].previous_stock, 2);
        assert_eq!(history[0].new_stock, 7);
        assert_eq!(history[0].reason, "supplier_delivery");
        assert!(history[0].order_id.is_empty());
    }

    #[test]
    fn test_restock_unknown_product_fails() {
        let (_ledger, coordinator) = setup();
        let err = coordinator.restock("ghost", 3, "supplier_delivery").unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_lock_timeout_surfaces_transaction_error() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);
        let coordinator = coordinator
            .with_lock_timeout(Duration::from_millis(20))
            .with_retry_policy(0, Duration::from_millis(1));

        let held = ledger.store().begin_write().unwrap();
        let err = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap_err();
        match err {
            StockError::Transaction { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(source, StoreError::Timeout(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        drop(held);

        // nothing mutated, and the token is still free
        assert_eq!(stock_of(&ledger, "lens-a"), 5);
        let coordinator = coordinator.with_lock_timeout(Duration::from_secs(5));
        let receipt = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap();
        assert_eq!(receipt.order_id, "order-1");
        assert_eq!(stock_of(&ledger, "lens-a"), 4);
    }

    #[test]
    fn test_transient_store_errors_are_retried() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);
        let coordinator = coordinator.with_retry_policy(3, Duration::from_millis(1));

        ledger.store().inject_write_failures(2);
        let receipt = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap();
        assert_eq!(receipt.order_id, "order-1");
        // exactly one decrement despite the retried attempts
        assert_eq!(stock_of(&ledger, "lens-a"), 4);
        assert_eq!(ledger.stock_history("lens-a").unwrap().len(), 1);
    }

    #[test]
    fn test_retry_budget_exhaustion_leaves_stock_unchanged() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 5);
        let coordinator = coordinator.with_retry_policy(2, Duration::from_millis(1));

        ledger.store().inject_write_failures(10);
        let err = coordinator
            .reserve("tok-1", "order-1", &["lens-a".to_string()])
            .unwrap_err();
        match err {
            StockError::Transaction { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        ledger.store().inject_write_failures(0);
        assert_eq!(stock_of(&ledger, "lens-a"), 5);
        assert!(ledger.stock_history("lens-a").unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_last_unit_serializes() {
        let (ledger, coordinator) = setup();
        seed(&ledger, "lens-a", 1);

        let mut handles = Vec::new();
        for i in 0..2 {
            let coordinator = coordinator.clone();
            handles.push(std::thread::spawn(move || {
                coordinator.reserve(
                    &format!("tok-{i}"),
                    &format!("order-{i}"),
                    &["lens-a".to_string()],
                )
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let shortfalls = results
            .iter()
            .filter(|r| matches!(r, Err(StockError::Insufficient { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(shortfalls, 1);
        assert_eq!(stock_of(&ledger, "lens-a"), 0);
    }
}
