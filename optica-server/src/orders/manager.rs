//! Orders manager
//!
//! Orchestrates the creation pipeline (validate, resolve products,
//! price, reserve stock, persist) and every post-creation transition.
//! This is the only component that calls the reservation coordinator,
//! so all stock movement funnels through one path.

use crate::db::StoreError;
use crate::orders::pricing::{self, PricingError};
use crate::orders::repository::OrderRepository;
use crate::orders::validate::{self, OrderDraft};
use crate::stock::{StockCoordinator, StockError, StockLedger};
use shared::dto::{
    CreateOrderRequest, FieldViolation, UpdateOrderRequest, UpdatePaymentRequest,
};
use shared::models::{LineItem, Order, OrderStatus, PaymentStatus};
use shared::util;
use thiserror::Error;

/// Change log reason recorded when a cancellation releases stock
const CANCEL_REASON: &str = "order_cancelled";

/// Change log reason recorded when order persistence fails after the
/// stock commit
const PERSIST_FAILURE_REASON: &str = "order_persist_failed";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldViolation>),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("insufficient stock for product {product_id}: have {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid payment transition: {from:?} -> {to:?}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<StockError> for OrderError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Insufficient {
                product_id,
                available,
                requested,
            } => OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            StockError::ProductNotFound(id) => OrderError::Validation(vec![FieldViolation::new(
                "products",
                "unknown_product",
                format!("product not found: {id}"),
            )]),
            StockError::Transaction { attempts, source } => {
                OrderError::Transaction(format!("gave up after {attempts} attempts: {source}"))
            }
            StockError::Store(source) => OrderError::Store(source),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrdersManager {
    repository: OrderRepository,
    coordinator: StockCoordinator,
    ledger: StockLedger,
}

impl OrdersManager {
    pub fn new(
        repository: OrderRepository,
        coordinator: StockCoordinator,
        ledger: StockLedger,
    ) -> Self {
        Self {
            repository,
            coordinator,
            ledger,
        }
    }

    /// Full creation pipeline
    ///
    /// Stock is reserved before the order is persisted; if persistence
    /// then fails, the reservation is compensated so the ledger
    /// reconciles to net zero for orders that never became durable.
    pub fn create_order(&self, req: &CreateOrderRequest) -> Result<Order, OrderError> {
        let draft = validate::validate_create(req).map_err(OrderError::Validation)?;
        let items = self.resolve_line_items(&draft)?;
        let final_price =
            pricing::derive_final_price(draft.total_price, draft.discount, draft.supplied_final_price)?;

        let order_id = util::new_id();
        let token = draft
            .idempotency_key
            .clone()
            .unwrap_or_else(util::new_id);

        let receipt = self
            .coordinator
            .reserve(&token, &order_id, &draft.product_ids)?;

        // A replayed token carries the original order id; if that order
        // was persisted, return it instead of creating a duplicate.
        let effective_id = receipt.order_id.clone();
        if effective_id != order_id {
            if let Some(existing) = self.repository.get(&effective_id)? {
                tracing::info!(order_id = %effective_id, token, "order creation replayed");
                return Ok(existing);
            }
            // receipt committed but the order not yet persisted: either
            // the original crashed between commit and persist, or it is
            // still racing us. Finish the job under the receipt's order
            // id; the insert-if-absent persist below keeps whichever
            // writer lands first.
        }

        let mut order = build_order(effective_id, draft, items, final_price);
        match self.repository.create(&mut order) {
            Ok(true) => {}
            Ok(false) => {
                // another caller of the same token persisted first;
                // `order` now holds its row, same service_order included
                tracing::info!(order_id = %order.id, token, "order creation replayed");
                return Ok(order);
            }
            Err(persist_err) => {
                tracing::error!(order_id = %order.id, error = %persist_err, "order persistence failed, restoring stock");
                if let Err(restore_err) = self.coordinator.restore(&order.id, PERSIST_FAILURE_REASON) {
                    tracing::error!(order_id = %order.id, error = %restore_err, "compensating restoration failed");
                }
                return Err(OrderError::Transaction(format!(
                    "order persistence failed: {persist_err}"
                )));
            }
        }

        tracing::info!(
            order_id = %order.id,
            service_order = order.service_order,
            items = order.items.len(),
            final_price = order.final_price,
            "order created"
        );
        Ok(order)
    }

    pub fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
        match self.repository.get(order_id)? {
            Some(order) if !order.is_deleted => Ok(order),
            _ => Err(OrderError::NotFound(order_id.to_string())),
        }
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.repository.list()?)
    }

    /// Move the order through its lifecycle state machine
    ///
    /// Cancellation releases reserved stock through the compensation
    /// path, exactly once.
    pub fn update_status(&self, order_id: &str, next: OrderStatus) -> Result<Order, OrderError> {
        let mut order = self.get_order(order_id)?;
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            // Restoration commits before the status write. If the write
            // fails the order stays non-terminal, and a retried cancel
            // skips the already-restored receipt, so the ledger never
            // double-credits. Persisting `cancelled` first would make a
            // failed restoration unreachable (cancelled is terminal).
            let restored = self.coordinator.restore(order_id, CANCEL_REASON)?;
            tracing::info!(order_id, restored, "order cancelled");
        }

        order.status = next;
        self.repository.update(&mut order)?;
        Ok(order)
    }

    /// Update the payment axis; payment status never regresses
    pub fn update_payment(
        &self,
        order_id: &str,
        req: &UpdatePaymentRequest,
    ) -> Result<Order, OrderError> {
        let mut order = self.get_order(order_id)?;
        if !order.payment_status.can_transition_to(req.payment_status) {
            return Err(OrderError::InvalidPaymentTransition {
                from: order.payment_status,
                to: req.payment_status,
            });
        }
        if let Some(entry) = req.payment_entry {
            if !entry.is_finite() || entry < 0.0 {
                return Err(OrderError::Validation(vec![FieldViolation::new(
                    "paymentEntry",
                    "out_of_range",
                    "paymentEntry must be a non-negative number",
                )]));
            }
            order.payment_entry = entry;
        }
        order.payment_status = req.payment_status;
        self.repository.update(&mut order)?;
        Ok(order)
    }

    /// Assign or clear the laboratory; never touches stock
    pub fn set_laboratory(
        &self,
        order_id: &str,
        laboratory_id: Option<String>,
    ) -> Result<Order, OrderError> {
        let mut order = self.get_order(order_id)?;
        order.laboratory_id = laboratory_id.filter(|s| !s.is_empty());
        self.repository.update(&mut order)?;
        Ok(order)
    }

    /// Apply a partial update to mutable fields
    ///
    /// `serviceOrder` in the payload is discarded; pricing is
    /// re-derived whenever a pricing field changes.
    pub fn apply_patch(
        &self,
        order_id: &str,
        req: &UpdateOrderRequest,
    ) -> Result<Order, OrderError> {
        validate::validate_update(req).map_err(OrderError::Validation)?;
        let mut order = self.get_order(order_id)?;

        if let Some(total) = req.total_price {
            order.total_price = total;
        }
        if let Some(discount) = req.discount {
            order.discount = discount;
        }
        if let Some(entry) = req.payment_entry {
            order.payment_entry = entry;
        }
        if let Some(installments) = req.installments {
            order.installments = installments;
        }
        if let Some(prescription) = &req.prescription_data {
            order.prescription_data = Some(prescription.clone());
        }
        if req.appointment_date.is_some() {
            // validate_update already checked the format
            order.appointment_date = req
                .appointment_date
                .as_deref()
                .and_then(validate::parse_date);
        }

        order.final_price =
            pricing::derive_final_price(order.total_price, order.discount, req.final_price)?;

        self.repository.update(&mut order)?;
        Ok(order)
    }

    /// Soft-delete an order
    pub fn delete_order(&self, order_id: &str) -> Result<(), OrderError> {
        if self.repository.soft_delete(order_id)? {
            Ok(())
        } else {
            Err(OrderError::NotFound(order_id.to_string()))
        }
    }

    /// Resolve each product reference into a priced line item snapshot
    fn resolve_line_items(&self, draft: &OrderDraft) -> Result<Vec<LineItem>, OrderError> {
        let mut items = Vec::with_capacity(draft.product_ids.len());
        let mut violations = Vec::new();

        for (i, product_id) in draft.product_ids.iter().enumerate() {
            match self.ledger.get_product(product_id)? {
                Some(product) if !product.is_deleted => items.push(LineItem {
                    product_id: product.id,
                    name: product.name,
                    unit_price: product.sell_price,
                }),
                _ => violations.push(FieldViolation::new(
                    format!("products[{i}]._id"),
                    "unknown_product",
                    format!("product not found: {product_id}"),
                )),
            }
        }

        if violations.is_empty() {
            Ok(items)
        } else {
            Err(OrderError::Validation(violations))
        }
    }
}

/// Assemble the order aggregate from its validated parts
fn build_order(id: String, draft: OrderDraft, items: Vec<LineItem>, final_price: f64) -> Order {
    let now = util::now_millis();
    let payment_status = if draft.payment_entry >= final_price && final_price > 0.0 {
        PaymentStatus::Paid
    } else if draft.payment_entry > 0.0 {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Pending
    };

    Order {
        id,
        service_order: 0, // assigned by the repository
        client_id: draft.client_id,
        employee_id: draft.employee_id,
        institution_id: draft.institution_id,
        is_institutional_order: draft.is_institutional_order,
        items,
        payment_method: draft.payment_method,
        payment_status,
        payment_entry: draft.payment_entry,
        installments: draft.installments,
        total_price: draft.total_price,
        discount: draft.discount,
        final_price,
        status: OrderStatus::Pending,
        laboratory_id: None,
        order_date: draft.order_date,
        appointment_date: draft.appointment_date,
        prescription_data: draft.prescription_data,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}
