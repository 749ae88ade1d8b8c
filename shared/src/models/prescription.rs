//! Optical prescription data
//!
//! Carried on the order aggregate; validated at the API boundary but
//! not part of the transactional core.

use serde::{Deserialize, Serialize};

/// Per-eye refraction parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EyeMeasure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sphere: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cylinder: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<f64>,
    /// Pupillary distance for this eye (mm)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pd: Option<f64>,
}

/// Frame measurements (mm)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeasurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Structured optical prescription
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub left_eye: EyeMeasure,
    #[serde(default)]
    pub right_eye: EyeMeasure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameMeasurements>,
}
