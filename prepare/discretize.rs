//! # Discretization of Numeric Features
//!
//! Every numeric clinical measurement is converted to an ordered categorical label before
//! it reaches the encoder bank. Intervals are half-open `[lower, upper)`: a value that
//! sits exactly on a boundary belongs to the bin that starts there.
//!
//! The same `Discretizer` is used at training time and is persisted verbatim in the model
//! artifact, so a raw value always maps to the same label no matter when it is binned.

use crate::types::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Label assigned to values that fall outside every interval (including NaN).
pub const OUT_OF_RANGE_LABEL: &str = "out-of-range";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BinError {
    #[error("A bin definition needs exactly one more edge than labels (got {edges} edges, {labels} labels).")]
    EdgeLabelMismatch { edges: usize, labels: usize },
    #[error("Bin edges must be strictly increasing, but edge {index} ({value}) does not exceed its predecessor.")]
    NonIncreasingEdges { index: usize, value: f64 },
    #[error("Bin edges must not be NaN.")]
    NanEdge,
    #[error("No bin definition exists for feature '{0}'.")]
    MissingDefinition(String),
}

/// Ordered boundaries plus a parallel sequence of labels for one numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinDefinition {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl BinDefinition {
    pub fn new<S: Into<String>>(edges: Vec<f64>, labels: Vec<S>) -> Result<Self, BinError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() || edges.len() != labels.len() + 1 {
            return Err(BinError::EdgeLabelMismatch {
                edges: edges.len(),
                labels: labels.len(),
            });
        }
        if edges.iter().any(|e| e.is_nan()) {
            return Err(BinError::NanEdge);
        }
        for (index, pair) in edges.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(BinError::NonIncreasingEdges {
                    index: index + 1,
                    value: pair[1],
                });
            }
        }
        Ok(Self { edges, labels })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the label of the interval containing `value`, or `None` when the value
    /// lies outside the outermost edges.
    pub fn label_for(&self, value: f64) -> Option<&str> {
        if value.is_nan() {
            return None;
        }
        // Index of the first edge strictly greater than `value`.
        let upper = self.edges.partition_point(|&edge| edge <= value);
        if upper == 0 || upper == self.edges.len() {
            return None;
        }
        Some(self.labels[upper - 1].as_str())
    }
}

/// The full set of bin definitions, keyed by feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    definitions: BTreeMap<String, BinDefinition>,
}

impl Discretizer {
    pub fn new(definitions: BTreeMap<Feature, BinDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|(feature, def)| (feature.name().to_string(), def))
                .collect(),
        }
    }

    pub fn definition(&self, feature: Feature) -> Option<&BinDefinition> {
        self.definitions.get(feature.name())
    }

    /// Re-checks every definition and that each numeric feature has one.
    pub fn validate(&self) -> Result<(), BinError> {
        for definition in self.definitions.values() {
            BinDefinition::new(definition.edges.clone(), definition.labels.clone())?;
        }
        match Feature::NUMERIC
            .iter()
            .find(|feature| self.definition(**feature).is_none())
        {
            Some(feature) => Err(BinError::MissingDefinition(feature.name().to_string())),
            None => Ok(()),
        }
    }

    /// Bins a single raw value. Values outside every interval receive
    /// [`OUT_OF_RANGE_LABEL`].
    pub fn bin(&self, feature: Feature, value: f64) -> Result<String, BinError> {
        let definition = self
            .definition(feature)
            .ok_or_else(|| BinError::MissingDefinition(feature.name().to_string()))?;
        Ok(definition
            .label_for(value)
            .unwrap_or(OUT_OF_RANGE_LABEL)
            .to_string())
    }

    /// Bins a whole column.
    pub fn bin_column(&self, feature: Feature, values: &[f64]) -> Result<Vec<String>, BinError> {
        let definition = self
            .definition(feature)
            .ok_or_else(|| BinError::MissingDefinition(feature.name().to_string()))?;
        Ok(values
            .iter()
            .map(|&v| definition.label_for(v).unwrap_or(OUT_OF_RANGE_LABEL).to_string())
            .collect())
    }
}

impl Default for Discretizer {
    fn default() -> Self {
        fn def(edges: &[f64], labels: &[&str]) -> BinDefinition {
            BinDefinition {
                edges: edges.to_vec(),
                labels: labels.iter().map(|s| s.to_string()).collect(),
            }
        }

        let mut definitions = BTreeMap::new();
        definitions.insert(
            Feature::Age,
            def(&[0.0, 40.0, 60.0, 100.0], &["<40", "40-60", ">60"]),
        );
        definitions.insert(
            Feature::RestingBp,
            def(
                &[0.0, 120.0, 140.0, 160.0, 300.0],
                &["Normal", "Elevated", "High S1", "High S2"],
            ),
        );
        definitions.insert(
            Feature::Cholesterol,
            def(&[0.0, 200.0, 240.0, 600.0], &["Normal", "Borderline", "High"]),
        );
        definitions.insert(
            Feature::MaxHr,
            def(
                &[0.0, 100.0, 140.0, 170.0, 250.0],
                &["Very Low", "Low", "Normal", "High"],
            ),
        );
        definitions.insert(
            Feature::Oldpeak,
            def(
                &[f64::NEG_INFINITY, 0.0, 1.0, 2.5, f64::INFINITY],
                &["Normal", "Low", "Medium", "High"],
            ),
        );
        Self::new(definitions)
    }
}

/// Replaces every exact zero in `values` with the column median and returns the median.
///
/// The median is computed over the column as given, zeros included.
pub fn replace_zeros_with_median(values: &mut [f64]) -> f64 {
    let median = median(values);
    for v in values.iter_mut() {
        if *v == 0.0 {
            *v = median;
        }
    }
    median
}

fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
