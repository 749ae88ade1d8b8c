//! Product Model
//!
//! Products are polymorphic on `productType`; the variant-specific
//! fields live in [`ProductKind`] rather than one struct full of
//! optionals.

use serde::{Deserialize, Serialize};

/// Product type with its variant-specific fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "productType", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProductKind {
    /// Prescription lenses
    Lenses {
        #[serde(skip_serializing_if = "Option::is_none")]
        lens_type: Option<String>,
    },
    /// Lens cleaning products
    CleanLenses {},
    /// Prescription eyeglass frame
    PrescriptionFrame {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
    },
    /// Sunglasses frame
    SunglassesFrame {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
}

impl ProductKind {
    /// The wire name of the product type tag
    pub fn type_name(&self) -> &'static str {
        match self {
            ProductKind::Lenses { .. } => "lenses",
            ProductKind::CleanLenses {} => "clean_lenses",
            ProductKind::PrescriptionFrame { .. } => "prescription_frame",
            ProductKind::SunglassesFrame { .. } => "sunglasses_frame",
        }
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub sell_price: f64,
    /// Sellable units on hand, never negative
    pub stock: i64,
    #[serde(flatten)]
    pub kind: ProductKind,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: i64,
}
