//! Order Model
//!
//! The order aggregate and its two lifecycle axes: order status and
//! payment status. Both axes only move through `can_transition_to`,
//! which the server enforces at the API boundary.

use super::prescription::PrescriptionData;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `pending → in_production → ready → delivered`, with `cancelled`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProduction,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, InProduction) => true,
            (InProduction, Ready) => true,
            (Ready, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Payment status - orthogonal to the order lifecycle, monotonic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    fn rank(&self) -> u8 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::PartiallyPaid => 1,
            PaymentStatus::Paid => 2,
        }
    }

    /// Payment status never regresses; staying put is a no-op
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        next.rank() >= self.rank()
    }
}

/// Payment method accepted at order creation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Check,
}

/// One line of an order
///
/// Each line references a single unit of a product; ordering two units
/// of the same product produces two lines. Name and unit price are
/// snapshots taken at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: f64,
}

/// Order aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-facing sequential order number, system-assigned
    pub service_order: u64,
    pub client_id: String,
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub is_institutional_order: bool,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Amount already received at creation time
    #[serde(default)]
    pub payment_entry: f64,
    #[serde(default)]
    pub installments: i32,
    pub total_price: f64,
    #[serde(default)]
    pub discount: f64,
    pub final_price: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laboratory_id: Option<String>,
    /// Epoch millis
    pub order_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_data: Option<PrescriptionData>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(InProduction));
        assert!(InProduction.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Delivered));
    }

    #[test]
    fn test_no_skipping_states() {
        use OrderStatus::*;
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!InProduction.can_transition_to(Delivered));
        assert!(!Ready.can_transition_to(InProduction));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProduction.can_transition_to(Cancelled));
        assert!(Ready.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        use OrderStatus::*;
        for next in [Pending, InProduction, Ready, Delivered, Cancelled] {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_payment_status_is_monotonic() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(PartiallyPaid));
        assert!(Pending.can_transition_to(Paid));
        assert!(PartiallyPaid.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(PartiallyPaid));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!PartiallyPaid.can_transition_to(Pending));
        // staying put is allowed
        assert!(Paid.can_transition_to(Paid));
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&OrderStatus::InProduction).unwrap();
        assert_eq!(json, "\"in_production\"");
        let status: PaymentStatus = serde_json::from_str("\"partially_paid\"").unwrap();
        assert_eq!(status, PaymentStatus::PartiallyPaid);
    }
}
