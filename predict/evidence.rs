//! Turning a submitted form into encoded network evidence.

use super::PredictError;
use super::form::FormData;
use super::reasons::risk_reasons;
use crate::artifact::ModelPackage;
use crate::types::Feature;
use std::collections::BTreeMap;

/// The encoded evidence for one request, plus the reasons derived along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    /// Node name to state code, for every feature that could be encoded.
    pub encoded: BTreeMap<String, usize>,
    /// Features left out because their label was never seen during training.
    pub skipped: Vec<Feature>,
    pub reasons: Vec<String>,
}

/// A parsed numeric field and the text used to echo it back to the user.
struct NumericInput {
    value: f64,
    display: String,
}

/// Parses a numeric field. `Oldpeak` is a decimal; every other numeric field is an
/// integer.
fn parse_numeric(form: &FormData, feature: Feature) -> Result<NumericInput, PredictError> {
    let text = form.require(feature.name())?.trim();
    let invalid = || PredictError::InvalidNumber {
        field: feature.name().to_string(),
        value: text.to_string(),
    };
    if feature == Feature::Oldpeak {
        let value: f64 = text.parse().map_err(|_| invalid())?;
        Ok(NumericInput {
            value,
            display: format_decimal(value),
        })
    } else {
        let value: i64 = text.parse().map_err(|_| invalid())?;
        Ok(NumericInput {
            value: value as f64,
            display: value.to_string(),
        })
    }
}

/// Formats a decimal so that whole numbers keep one fractional digit (`3.0`, not `3`).
fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Builds the evidence for `form` using the package's bins and encoders.
///
/// Missing or unparseable fields fail the whole request. A label the encoder has never
/// seen only drops that one feature from the evidence.
pub fn build_evidence(form: &FormData, package: &ModelPackage) -> Result<Evidence, PredictError> {
    let mut labels: BTreeMap<Feature, String> = BTreeMap::new();
    let mut raw: BTreeMap<Feature, String> = BTreeMap::new();

    for feature in Feature::NUMERIC {
        let input = parse_numeric(form, feature)?;
        labels.insert(feature, package.bins.bin(feature, input.value)?);
        raw.insert(feature, input.display);
    }
    for feature in Feature::CATEGORICAL {
        let value = form.require(feature.name())?.to_string();
        labels.insert(feature, value.clone());
        raw.insert(feature, value);
    }

    let reasons = risk_reasons(&labels, &raw);

    let mut encoded = BTreeMap::new();
    let mut skipped = Vec::new();
    for &feature in &package.all_features {
        let Some(label) = labels.get(&feature) else {
            continue;
        };
        match package
            .encoders
            .feature(feature)
            .and_then(|encoder| encoder.transform(label))
        {
            Ok(code) => {
                encoded.insert(feature.name().to_string(), code);
            }
            Err(err) => {
                log::warn!("Skipping '{feature}' with value '{label}': {err}");
                skipped.push(feature);
            }
        }
    }
    log::debug!("Evidence: {encoded:?}");

    Ok(Evidence {
        encoded,
        skipped,
        reasons,
    })
}
