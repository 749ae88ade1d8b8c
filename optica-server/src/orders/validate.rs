//! Order request validation
//!
//! Validation runs as an ordered list of named rules over the raw
//! request. Each rule pushes structured field-level violations instead
//! of failing fast, so a response reports everything wrong with the
//! payload at once. Pure functions, no side effects.

use chrono::{DateTime, NaiveDate, Utc};
use shared::dto::{CreateOrderRequest, FieldViolation, UpdateOrderRequest};
use shared::models::{PaymentMethod, PrescriptionData};
use shared::util;

/// Normalized output of a successful create validation
///
/// Dates are canonicalized to epoch millis and all defaulted fields
/// are filled in, so downstream stages never re-check the raw payload.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub client_id: String,
    pub employee_id: String,
    pub institution_id: Option<String>,
    pub is_institutional_order: bool,
    pub product_ids: Vec<String>,
    pub payment_method: PaymentMethod,
    pub payment_entry: f64,
    pub installments: i32,
    pub total_price: f64,
    pub discount: f64,
    /// Caller-supplied final price, authoritative value derived later
    pub supplied_final_price: Option<f64>,
    pub order_date: i64,
    pub appointment_date: Option<i64>,
    pub prescription_data: Option<PrescriptionData>,
    pub idempotency_key: Option<String>,
}

type Rule = fn(&CreateOrderRequest, &mut Vec<FieldViolation>);

/// Create-schema rules, evaluated in order, all of them always
const CREATE_RULES: &[Rule] = &[
    rule_required_references,
    rule_products_present,
    rule_payment_method_present,
    rule_total_price,
    rule_discount,
    rule_final_price_within_total,
    rule_payment_entry,
    rule_institutional_reference,
    rule_dates_parse,
];

/// Validate an order-creation request
///
/// Returns the normalized draft, or every violation found.
pub fn validate_create(req: &CreateOrderRequest) -> Result<OrderDraft, Vec<FieldViolation>> {
    let mut violations = Vec::new();
    for rule in CREATE_RULES {
        rule(req, &mut violations);
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    // Rules above guarantee presence; normalization cannot fail here
    let order_date = match &req.order_date {
        Some(raw) => parse_date(raw).unwrap_or_else(util::now_millis),
        None => util::now_millis(),
    };
    let appointment_date = req
        .appointment_date
        .as_deref()
        .and_then(parse_date);

    Ok(OrderDraft {
        client_id: req.client_id.clone().unwrap_or_default(),
        employee_id: req.employee_id.clone().unwrap_or_default(),
        institution_id: req.institution_id.clone().filter(|s| !s.is_empty()),
        is_institutional_order: req.is_institutional_order.unwrap_or(false),
        product_ids: req
            .products
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.id)
            .collect(),
        payment_method: req.payment_method.unwrap_or(PaymentMethod::Cash),
        payment_entry: req.payment_entry.unwrap_or(0.0),
        installments: req.installments.unwrap_or(1),
        total_price: req.total_price.unwrap_or(0.0),
        discount: req.discount.unwrap_or(0.0),
        supplied_final_price: req.final_price,
        order_date,
        appointment_date,
        prescription_data: req.prescription_data.clone(),
        idempotency_key: req.idempotency_key.clone().filter(|s| !s.is_empty()),
    })
}

/// Validate an order-update request (every field optional)
///
/// Identity fields are not part of the update schema; `serviceOrder`
/// deserializes but is discarded here, never applied.
pub fn validate_update(req: &UpdateOrderRequest) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    for (path, value) in [
        ("totalPrice", req.total_price),
        ("discount", req.discount),
        ("finalPrice", req.final_price),
        ("paymentEntry", req.payment_entry),
    ] {
        if let Some(v) = value {
            check_money(path, v, &mut violations);
        }
    }

    if let (Some(final_price), Some(total)) = (req.final_price, req.total_price) {
        if final_price > total {
            violations.push(FieldViolation::new(
                "finalPrice",
                "out_of_range",
                "finalPrice must not exceed totalPrice",
            ));
        }
    }
    if let (Some(discount), Some(total)) = (req.discount, req.total_price) {
        if discount > total {
            violations.push(FieldViolation::new(
                "discount",
                "out_of_range",
                "discount must not exceed totalPrice",
            ));
        }
    }
    if let Some(raw) = req.appointment_date.as_deref() {
        if parse_date(raw).is_none() {
            violations.push(invalid_date("appointmentDate"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// ========== Rules ==========

fn rule_required_references(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    if req.client_id.as_deref().is_none_or(str::is_empty) {
        out.push(required("clientId"));
    }
    if req.employee_id.as_deref().is_none_or(str::is_empty) {
        out.push(required("employeeId"));
    }
}

fn rule_products_present(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    match &req.products {
        None => out.push(required("products")),
        Some(products) if products.is_empty() => out.push(FieldViolation::new(
            "products",
            "empty",
            "order must reference at least one product",
        )),
        Some(products) => {
            for (i, product) in products.iter().enumerate() {
                if product.id.is_empty() {
                    out.push(required(&format!("products[{i}]._id")));
                }
            }
        }
    }
}

fn rule_payment_method_present(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    if req.payment_method.is_none() {
        out.push(required("paymentMethod"));
    }
}

fn rule_total_price(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    match req.total_price {
        None => out.push(required("totalPrice")),
        Some(total) if !total.is_finite() => out.push(not_a_number("totalPrice")),
        Some(total) if total <= 0.0 => out.push(FieldViolation::new(
            "totalPrice",
            "out_of_range",
            "totalPrice must be greater than zero",
        )),
        Some(_) => {}
    }
}

fn rule_discount(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    let Some(discount) = req.discount else { return };
    check_money("discount", discount, out);
    if let Some(total) = req.total_price {
        if discount.is_finite() && discount > total {
            out.push(FieldViolation::new(
                "discount",
                "out_of_range",
                "discount must not exceed totalPrice",
            ));
        }
    }
}

fn rule_final_price_within_total(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    let Some(final_price) = req.final_price else {
        return;
    };
    check_money("finalPrice", final_price, out);
    if let Some(total) = req.total_price {
        if final_price.is_finite() && final_price > total {
            out.push(FieldViolation::new(
                "finalPrice",
                "out_of_range",
                "finalPrice must not exceed totalPrice",
            ));
        }
    }
}

fn rule_payment_entry(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    if let Some(entry) = req.payment_entry {
        check_money("paymentEntry", entry, out);
    }
}

fn rule_institutional_reference(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    if req.is_institutional_order == Some(true)
        && req.institution_id.as_deref().is_none_or(str::is_empty)
    {
        out.push(FieldViolation::new(
            "institutionId",
            "required",
            "institutionId is required for institutional orders",
        ));
    }
}

fn rule_dates_parse(req: &CreateOrderRequest, out: &mut Vec<FieldViolation>) {
    if let Some(raw) = req.order_date.as_deref() {
        if parse_date(raw).is_none() {
            out.push(invalid_date("orderDate"));
        }
    }
    if let Some(raw) = req.appointment_date.as_deref() {
        if parse_date(raw).is_none() {
            out.push(invalid_date("appointmentDate"));
        }
    }
}

// ========== Helpers ==========

fn check_money(path: &str, value: f64, out: &mut Vec<FieldViolation>) {
    if !value.is_finite() {
        out.push(not_a_number(path));
    } else if value < 0.0 {
        out.push(FieldViolation::new(
            path,
            "out_of_range",
            format!("{path} must not be negative"),
        ));
    }
}

fn required(path: &str) -> FieldViolation {
    FieldViolation::new(path, "required", format!("{path} is required"))
}

fn not_a_number(path: &str) -> FieldViolation {
    FieldViolation::new(path, "invalid_number", format!("{path} must be a finite number"))
}

fn invalid_date(path: &str) -> FieldViolation {
    FieldViolation::new(
        path,
        "invalid_date",
        format!("{path} must be an RFC 3339 timestamp or YYYY-MM-DD"),
    )
}

/// Coerce a date string to epoch millis
///
/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_date(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
