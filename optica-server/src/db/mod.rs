//! redb-based storage layer
//!
//! One embedded database holds every table of the back-office core:
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog + current stock |
//! | `stock_log` | `(product_id, seq)` | `StockChangeEntry` | Append-only audit trail |
//! | `reservations` | `token` | `ReservationReceipt` | Idempotency for stock reservation |
//! | `reservation_by_order` | `order_id` | `token` | Lookup for compensation |
//! | `orders` | `order_id` | `Order` | Order aggregates |
//! | `counters` | name | `u64` | Service order number, log sequence |
//!
//! # Durability
//!
//! redb commits are durable as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), which keeps the stock ledger consistent
//! across unexpected shutdowns.
//!
//! # Concurrency
//!
//! redb allows a single writer at a time; concurrent write transactions
//! are strictly serialized. The stock coordinator relies on this: a
//! sufficiency check always observes the previous writer's committed
//! decrement, never a stale read.

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Catalog table: key = product_id, value = JSON-serialized Product
pub const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Stock change log: key = (product_id, seq), value = JSON-serialized StockChangeEntry
pub const STOCK_LOG_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("stock_log");

/// Reservation receipts: key = idempotency token, value = JSON-serialized ReservationReceipt
pub const RESERVATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// Reverse index: key = order_id, value = idempotency token
pub const RESERVATION_BY_ORDER_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("reservation_by_order");

/// Orders: key = order_id, value = JSON-serialized Order
pub const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Counters: key = counter name, value = u64
pub const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter key for the human-facing service order number
pub const SERVICE_ORDER_KEY: &str = "service_order";

/// Counter key for the stock log sequence
pub const STOCK_LOG_SEQ_KEY: &str = "stock_log_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Write transaction not acquired within {0:?}")]
    Timeout(Duration),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to the embedded database
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    #[cfg(test)]
    fail_writes: Arc<std::sync::atomic::AtomicU32>,
}

impl Store {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self {
            db: Arc::new(db),
            #[cfg(test)]
            fail_writes: Default::default(),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (tests and ephemeral tooling)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self {
            db: Arc::new(db),
            #[cfg(test)]
            fail_writes: Default::default(),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so read transactions never hit a missing table
    fn init_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(PRODUCTS_TABLE)?;
            let _ = txn.open_table(STOCK_LOG_TABLE)?;
            let _ = txn.open_table(RESERVATIONS_TABLE)?;
            let _ = txn.open_table(RESERVATION_BY_ORDER_TABLE)?;
            let _ = txn.open_table(ORDERS_TABLE)?;

            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            if counters.get(SERVICE_ORDER_KEY)?.is_none() {
                counters.insert(SERVICE_ORDER_KEY, 0u64)?;
            }
            if counters.get(STOCK_LOG_SEQ_KEY)?.is_none() {
                counters.insert(STOCK_LOG_SEQ_KEY, 0u64)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (blocks while another writer is active)
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a write transaction, giving up after `timeout`
    ///
    /// redb's writer lock has no native deadline, so acquisition runs on
    /// a helper thread and the caller waits on a channel. A caller that
    /// times out gets [`StoreError::Timeout`] and has mutated nothing;
    /// if the helper acquires the lock afterwards, the unclaimed
    /// transaction is dropped, which aborts it.
    pub fn begin_write_bounded(&self, timeout: Duration) -> StoreResult<WriteTransaction> {
        #[cfg(test)]
        {
            use std::sync::atomic::Ordering;
            let pending = self.fail_writes.load(Ordering::SeqCst);
            if pending > 0 {
                self.fail_writes.store(pending - 1, Ordering::SeqCst);
                return Err(StoreError::Timeout(timeout));
            }
        }

        let (sender, receiver) = std::sync::mpsc::channel();
        let db = Arc::clone(&self.db);
        std::thread::spawn(move || {
            let _ = sender.send(db.begin_write());
        });

        match receiver.recv_timeout(timeout) {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout(timeout)),
        }
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Increment a named counter within a transaction, returning the new value
    pub fn increment_counter(&self, txn: &WriteTransaction, key: &str) -> StoreResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(key)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    /// Read a named counter (read-only)
    pub fn get_counter(&self, key: &str) -> StoreResult<u64> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(key)?.map(|g| g.value()).unwrap_or(0))
    }
}

#[cfg(test)]
impl Store {
    /// Make the next `n` calls to `begin_write_bounded` fail with
    /// [`StoreError::Timeout`]
    pub fn inject_write_failures(&self, n: u32) {
        self.fail_writes.store(n, std::sync::atomic::Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero_and_increment() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get_counter(SERVICE_ORDER_KEY).unwrap(), 0);

        let txn = store.begin_write().unwrap();
        let first = store.increment_counter(&txn, SERVICE_ORDER_KEY).unwrap();
        txn.commit().unwrap();
        assert_eq!(first, 1);

        let txn = store.begin_write().unwrap();
        let second = store.increment_counter(&txn, SERVICE_ORDER_KEY).unwrap();
        txn.commit().unwrap();
        assert_eq!(second, 2);
        assert_eq!(store.get_counter(SERVICE_ORDER_KEY).unwrap(), 2);
    }

    #[test]
    fn test_bounded_write_times_out_while_writer_is_active() {
        let store = Store::open_in_memory().unwrap();
        let held = store.begin_write().unwrap();

        let result = store.begin_write_bounded(Duration::from_millis(20));
        assert!(matches!(result, Err(StoreError::Timeout(_))));

        drop(held);
        let txn = store.begin_write_bounded(Duration::from_secs(1)).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn test_uncommitted_counter_is_not_visible() {
        let store = Store::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store.increment_counter(&txn, STOCK_LOG_SEQ_KEY).unwrap();
        drop(txn); // abort

        assert_eq!(store.get_counter(STOCK_LOG_SEQ_KEY).unwrap(), 0);
    }
}
