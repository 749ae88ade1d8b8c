//! Pricing engine
//!
//! Derives the authoritative `final_price` from the total, the
//! discount, and an optional caller-supplied value. Arithmetic runs on
//! [`Decimal`] so repeated discounts never accumulate float error; the
//! wire format stays f64.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("monetary value is not a finite number: {field}")]
    NotFinite { field: &'static str },

    #[error("derived final price is negative: {total} - {discount}")]
    NegativeResult { total: f64, discount: f64 },
}

/// Derive the final price for an order
///
/// A caller-supplied final price is accepted as-is when it does not
/// exceed the total (the validator already rejected anything above);
/// otherwise `total - discount` is computed, rounded to cents. A
/// negative result is an error, never clamped.
pub fn derive_final_price(
    total: f64,
    discount: f64,
    supplied: Option<f64>,
) -> Result<f64, PricingError> {
    let total_d = to_decimal(total, "totalPrice")?;
    let discount_d = to_decimal(discount, "discount")?;

    if let Some(final_price) = supplied {
        let supplied_d = to_decimal(final_price, "finalPrice")?;
        if supplied_d.is_sign_negative() {
            return Err(PricingError::NegativeResult { total, discount });
        }
        if supplied_d <= total_d {
            return Ok(round_cents(supplied_d));
        }
    }

    let derived = total_d - discount_d;
    if derived.is_sign_negative() {
        return Err(PricingError::NegativeResult { total, discount });
    }
    Ok(round_cents(derived))
}

fn to_decimal(value: f64, field: &'static str) -> Result<Decimal, PricingError> {
    if !value.is_finite() {
        return Err(PricingError::NotFinite { field });
    }
    Decimal::from_f64(value).ok_or(PricingError::NotFinite { field })
}

fn round_cents(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}
