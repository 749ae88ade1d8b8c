//! Request/response payloads for the HTTP API
//!
//! Create payloads keep every field optional so that the validator can
//! report all missing/invalid fields together instead of failing on
//! the first deserialization error.

use crate::models::{OrderStatus, PaymentMethod, PaymentStatus, PrescriptionData, ProductKind};
use serde::{Deserialize, Serialize};

/// A single field-level validation violation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    /// Path of the offending field, e.g. `institutionId`
    pub path: String,
    /// Machine-readable code, e.g. `required`, `out_of_range`
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        path: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Line item reference in an order-creation request
///
/// Quantity is implicit: one entry is one unit, duplicate ids mean
/// multiple units of the same product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "productType", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

/// Create order payload (`POST /api/orders`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub client_id: Option<String>,
    pub employee_id: Option<String>,
    pub institution_id: Option<String>,
    pub is_institutional_order: Option<bool>,
    pub products: Option<Vec<ProductRef>>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_entry: Option<f64>,
    pub installments: Option<i32>,
    pub total_price: Option<f64>,
    pub discount: Option<f64>,
    pub final_price: Option<f64>,
    /// RFC 3339 or `YYYY-MM-DD`
    pub order_date: Option<String>,
    pub appointment_date: Option<String>,
    pub prescription_data: Option<PrescriptionData>,
    /// Caller-supplied idempotency token; a retry with the same key
    /// returns the previously created order instead of reserving twice
    pub idempotency_key: Option<String>,
}

/// Update order payload (`PUT /api/orders/:id`)
///
/// Identity fields are immutable and absent here; `serviceOrder` is
/// accepted on the wire but silently discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOrderRequest {
    pub payment_entry: Option<f64>,
    pub installments: Option<i32>,
    pub total_price: Option<f64>,
    pub discount: Option<f64>,
    pub final_price: Option<f64>,
    pub appointment_date: Option<String>,
    pub prescription_data: Option<PrescriptionData>,
    /// System-assigned, never settable; kept so payloads carrying it
    /// still deserialize
    pub service_order: Option<serde_json::Value>,
}

/// Status transition payload (`PUT /api/orders/:id/status`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Payment update payload (`PUT /api/orders/:id/payment`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_entry: Option<f64>,
}

/// Laboratory assignment payload (`PUT /api/orders/:id/laboratory`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLaboratoryRequest {
    pub laboratory_id: Option<String>,
}

/// Create product payload (`POST /api/products`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub sell_price: f64,
    pub stock: i64,
    #[serde(flatten)]
    pub kind: ProductKind,
}

/// Restock payload (`POST /api/products/:id/restock`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockRequest {
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_tolerates_missing_fields() {
        let req: CreateOrderRequest = serde_json::from_str("{}").unwrap();
        assert!(req.client_id.is_none());
        assert!(req.products.is_none());
    }

    #[test]
    fn test_product_ref_uses_underscore_id() {
        let json = serde_json::json!({ "_id": "prod-1", "productType": "lenses" });
        let re: ProductRef = serde_json::from_value(json).unwrap();
        assert_eq!(re.id, "prod-1");
        assert_eq!(re.product_type.as_deref(), Some("lenses"));
    }

    #[test]
    fn test_update_request_accepts_service_order_without_using_it() {
        let json = serde_json::json!({ "serviceOrder": 9999, "discount": 10.0 });
        let req: UpdateOrderRequest = serde_json::from_value(json).unwrap();
        assert!(req.service_order.is_some());
        assert_eq!(req.discount, Some(10.0));
    }
}
