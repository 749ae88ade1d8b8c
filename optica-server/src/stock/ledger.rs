//! Stock ledger
//!
//! Per-product stock counters plus the append-only stock change log.
//! Every mutation goes through a caller-supplied [`WriteTransaction`]
//! so the reservation coordinator can commit a whole batch atomically.
//! Stock is mutated exclusively through the coordinator; everything
//! else only reads.

use crate::db::{
    PRODUCTS_TABLE, STOCK_LOG_SEQ_KEY, STOCK_LOG_TABLE, Store, StoreResult,
};
use redb::{ReadableTable, WriteTransaction};
use shared::models::{Product, StockChangeEntry};

/// Read/write access to product stock and the stock change log
#[derive(Clone, Debug)]
pub struct StockLedger {
    store: Store,
}

impl StockLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========== Product Operations ==========

    /// Get a product by id (read-only)
    pub fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a product by id within a write transaction
    ///
    /// Used by the coordinator so the sufficiency check and the
    /// decrement see the same committed state.
    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StoreResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a product within a write transaction
    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StoreResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Insert or replace a product in its own transaction
    pub fn put_product(&self, product: &Product) -> StoreResult<()> {
        let txn = self.store.begin_write()?;
        self.put_product_txn(&txn, product)?;
        txn.commit()?;
        Ok(())
    }

    /// List all non-deleted products
    pub fn list_products(&self) -> StoreResult<Vec<Product>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let product: Product = serde_json::from_slice(value.value())?;
            if !product.is_deleted {
                products.push(product);
            }
        }
        Ok(products)
    }

    // ========== Stock Change Log ==========

    /// Append one entry to the change log within a write transaction
    ///
    /// The log is diagnostic, not the source of truth for current
    /// stock; callers tolerate (and log) append failures rather than
    /// aborting a decrement over them.
    pub fn append_log_txn(
        &self,
        txn: &WriteTransaction,
        entry: &StockChangeEntry,
    ) -> StoreResult<()> {
        let seq = self.store.increment_counter(txn, STOCK_LOG_SEQ_KEY)?;
        let mut table = txn.open_table(STOCK_LOG_TABLE)?;
        let key = (entry.product_id.as_str(), seq);
        let value = serde_json::to_vec(entry)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Change log entries for one product, most-recent-first
    pub fn stock_history(&self, product_id: &str) -> StoreResult<Vec<StockChangeEntry>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(STOCK_LOG_TABLE)?;

        let range_start = (product_id, 0u64);
        let range_end = (product_id, u64::MAX);

        let mut entries = Vec::new();
        for result in table.range(range_start..=range_end)?.rev() {
            let (_key, value) = result?;
            let entry: StockChangeEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
