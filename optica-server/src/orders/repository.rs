//! Order repository
//!
//! Persists the order aggregate. Creation assigns the human-facing
//! `service_order` number from a durable counter in the same
//! transaction as the insert, so numbers survive restarts and never
//! repeat. Orders are soft-deleted, never removed.

use crate::db::{ORDERS_TABLE, SERVICE_ORDER_KEY, Store, StoreResult};
use redb::ReadableTable;
use shared::models::Order;
use shared::util::now_millis;

#[derive(Clone, Debug)]
pub struct OrderRepository {
    store: Store,
    #[cfg(test)]
    fail_next_create: std::sync::Arc<std::sync::atomic::AtomicBool>,
    #[cfg(test)]
    fail_next_update: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl OrderRepository {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            #[cfg(test)]
            fail_next_create: Default::default(),
            #[cfg(test)]
            fail_next_update: Default::default(),
        }
    }

    /// Persist a new order, assigning its service order number
    ///
    /// Insert-if-absent: when an order with the same id is already
    /// stored (a replayed creation racing the original), the stored row
    /// is copied into `order` and returned without touching the service
    /// order counter. Returns `true` only when this call inserted.
    pub fn create(&self, order: &mut Order) -> StoreResult<bool> {
        #[cfg(test)]
        if self
            .fail_next_create
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(serde_json::from_str::<i32>("injected failure").unwrap_err().into());
        }

        let txn = self.store.begin_write()?;
        {
            let table = txn.open_table(ORDERS_TABLE)?;
            if let Some(existing) = table.get(order.id.as_str())? {
                *order = serde_json::from_slice(existing.value())?;
                // txn dropped without commit, nothing written
                return Ok(false);
            }
        }
        order.service_order = self.store.increment_counter(&txn, SERVICE_ORDER_KEY)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(true)
    }

    /// Fetch an order by id, including soft-deleted ones
    pub fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Replace an existing order, bumping `updated_at`
    pub fn update(&self, order: &mut Order) -> StoreResult<()> {
        #[cfg(test)]
        if self
            .fail_next_update
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(serde_json::from_str::<i32>("injected failure").unwrap_err().into());
        }

        order.updated_at = now_millis();
        let txn = self.store.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// List all non-deleted orders
    pub fn list(&self) -> StoreResult<Vec<Order>> {
        let read_txn = self.store.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if !order.is_deleted {
                orders.push(order);
            }
        }
        // newest first for operational listing
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Soft-delete an order; returns whether anything changed
    pub fn soft_delete(&self, order_id: &str) -> StoreResult<bool> {
        let Some(mut order) = self.get(order_id)? else {
            return Ok(false);
        };
        if order.is_deleted {
            return Ok(false);
        }
        order.is_deleted = true;
        self.update(&mut order)?;
        Ok(true)
    }

    #[cfg(test)]
    pub fn inject_create_failure(&self) {
        self.fail_next_create
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn inject_update_failure(&self) {
        self.fail_next_update
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
