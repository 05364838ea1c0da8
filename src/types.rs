// ========================================================================================
//
//                       CORE DATA TYPES FOR THE HEARTNET ENGINE
//
// ========================================================================================
//
// This module is the canonical dictionary of the clinical variables that cross the
// architectural boundaries of the application (`prepare`, `network`, `predict`).
//
// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The column holding the outcome the network is queried for.
pub const TARGET_COLUMN: &str = "HeartDisease";

/// The target label treated as the positive (diseased) class.
pub const POSITIVE_TARGET_LABEL: &str = "1";

// ========================================================================================
//                                  FEATURE IDENTIFIERS
// ========================================================================================

/// Whether a feature is measured on a continuous scale or already categorical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Discretized into ordered bins before encoding.
    Numeric,
    /// Encoded directly from its raw label.
    Categorical,
}

/// One of the eleven clinical input variables.
///
/// The serialized form is the exact column name used in the training file and in the
/// prediction form, so the artifact stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Age,
    Sex,
    ChestPainType,
    #[serde(rename = "RestingBP")]
    RestingBp,
    Cholesterol,
    #[serde(rename = "FastingBS")]
    FastingBs,
    #[serde(rename = "RestingECG")]
    RestingEcg,
    #[serde(rename = "MaxHR")]
    MaxHr,
    ExerciseAngina,
    Oldpeak,
    #[serde(rename = "ST_Slope")]
    StSlope,
}

impl Feature {
    /// Features discretized through a bin definition, in canonical order.
    pub const NUMERIC: [Feature; 5] = [
        Feature::Age,
        Feature::RestingBp,
        Feature::Cholesterol,
        Feature::MaxHr,
        Feature::Oldpeak,
    ];

    /// Features passed through as raw labels, in canonical order.
    pub const CATEGORICAL: [Feature; 6] = [
        Feature::Sex,
        Feature::ChestPainType,
        Feature::FastingBs,
        Feature::RestingEcg,
        Feature::ExerciseAngina,
        Feature::StSlope,
    ];

    /// Column order of the public heart-failure dataset. The training table keeps
    /// this order so that learned structures are stable across runs.
    pub const DATASET_ORDER: [Feature; 11] = [
        Feature::Age,
        Feature::Sex,
        Feature::ChestPainType,
        Feature::RestingBp,
        Feature::Cholesterol,
        Feature::FastingBs,
        Feature::RestingEcg,
        Feature::MaxHr,
        Feature::ExerciseAngina,
        Feature::Oldpeak,
        Feature::StSlope,
    ];

    /// The canonical evidence order: numeric features followed by categorical ones.
    pub fn canonical_order() -> Vec<Feature> {
        Self::NUMERIC
            .iter()
            .chain(Self::CATEGORICAL.iter())
            .copied()
            .collect()
    }

    pub fn kind(self) -> FeatureKind {
        if Self::NUMERIC.contains(&self) {
            FeatureKind::Numeric
        } else {
            FeatureKind::Categorical
        }
    }

    /// The exact column / form-field name.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "Age",
            Feature::Sex => "Sex",
            Feature::ChestPainType => "ChestPainType",
            Feature::RestingBp => "RestingBP",
            Feature::Cholesterol => "Cholesterol",
            Feature::FastingBs => "FastingBS",
            Feature::RestingEcg => "RestingECG",
            Feature::MaxHr => "MaxHR",
            Feature::ExerciseAngina => "ExerciseAngina",
            Feature::Oldpeak => "Oldpeak",
            Feature::StSlope => "ST_Slope",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name one of the eleven features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeature(pub String);

impl fmt::Display for UnknownFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a known clinical feature", self.0)
    }
}

impl std::error::Error for UnknownFeature {}

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DATASET_ORDER
            .iter()
            .copied()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}
