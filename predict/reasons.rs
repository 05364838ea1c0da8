//! Human-readable risk factors.
//!
//! These are fixed threshold rules over the submitted values and their bin labels. They
//! do not consult the network, so a reason can appear even when the model weighs that
//! factor lightly.

use crate::types::Feature;
use std::collections::BTreeMap;

/// Shown when no rule fires.
pub const NO_REASONS_MESSAGE: &str = "Your risk factors appear to be under control.";

/// Evaluates every rule in a fixed order and returns the messages of those that fire.
///
/// `labels` holds the bin label of each numeric feature and the raw value of each
/// categorical one; `raw` holds the submitted text used inside the messages.
pub fn risk_reasons(
    labels: &BTreeMap<Feature, String>,
    raw: &BTreeMap<Feature, String>,
) -> Vec<String> {
    let label = |feature: Feature| labels.get(&feature).map(String::as_str).unwrap_or_default();
    let value = |feature: Feature| raw.get(&feature).map(String::as_str).unwrap_or_default();

    let mut reasons = Vec::new();
    if label(Feature::Age) == ">60" {
        reasons.push(format!("Advanced age ({} years)", value(Feature::Age)));
    }
    if matches!(label(Feature::RestingBp), "High S1" | "High S2") {
        reasons.push(format!("High blood pressure ({} mmHg)", value(Feature::RestingBp)));
    }
    if matches!(label(Feature::Cholesterol), "Borderline" | "High") {
        reasons.push(format!("High cholesterol ({} mg/dl)", value(Feature::Cholesterol)));
    }
    if matches!(label(Feature::Oldpeak), "Medium" | "High") {
        reasons.push(format!(
            "Elevated ST depression ({}) during exercise",
            value(Feature::Oldpeak)
        ));
    }
    if !matches!(label(Feature::ChestPainType), "ATA" | "NAP") {
        reasons.push(format!("Chest pain type ({})", value(Feature::ChestPainType)));
    }
    if label(Feature::ExerciseAngina) == "Y" {
        reasons.push("Exercise-induced angina".to_string());
    }
    if label(Feature::StSlope) == "Flat" {
        reasons.push("Flat ST slope".to_string());
    }
    reasons
}
