//! Training-time preprocessing: cleaning, discretization, encoding and rebalancing.

pub mod data;
pub mod discretize;
pub mod encode;
pub mod resample;

use crate::types::{Feature, FeatureKind};
use data::TrainingData;
use discretize::{BinError, Discretizer, replace_zeros_with_median};
use encode::{EncodeError, EncodedTable, EncoderBank, fit_encode};
use std::collections::BTreeMap;
use thiserror::Error;

/// Measurements for which an exact zero is physiologically impossible and is treated
/// as a missing value during training.
pub const ZERO_INVALID_FEATURES: [Feature; 2] = [Feature::RestingBp, Feature::Cholesterol];

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("Discretization failed: {0}")]
    Bin(#[from] BinError),
    #[error("Label encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("The training data has no column for feature '{0}'.")]
    MissingColumn(String),
}

/// The encoded table together with the encoders fitted on it.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub encoders: EncoderBank,
    pub table: EncodedTable,
    /// Median substituted for zeros, per cleaned feature.
    pub medians: BTreeMap<Feature, f64>,
}

/// Replaces zeros in [`ZERO_INVALID_FEATURES`] with the column median.
///
/// Only the trainer calls this. Inference bins submitted values as they are.
pub fn clean_zero_measurements(
    numeric: &mut BTreeMap<Feature, Vec<f64>>,
) -> Result<BTreeMap<Feature, f64>, PrepareError> {
    let mut medians = BTreeMap::new();
    for feature in ZERO_INVALID_FEATURES {
        let column = numeric
            .get_mut(&feature)
            .ok_or_else(|| PrepareError::MissingColumn(feature.name().to_string()))?;
        let zeros = column.iter().filter(|&&v| v == 0.0).count();
        let median = replace_zeros_with_median(column);
        log::info!(
            "Replaced {} zero value(s) in '{}' with the median {:.1}",
            zeros,
            feature,
            median
        );
        medians.insert(feature, median);
    }
    Ok(medians)
}

/// Cleans, bins and encodes the raw training table.
pub fn preprocess(data: &TrainingData, bins: &Discretizer) -> Result<PreparedData, PrepareError> {
    let mut numeric = data.numeric.clone();
    let medians = clean_zero_measurements(&mut numeric)?;

    let mut columns: Vec<(Feature, Vec<String>)> = Vec::with_capacity(Feature::DATASET_ORDER.len());
    for feature in Feature::DATASET_ORDER {
        let labels = match feature.kind() {
            FeatureKind::Numeric => {
                let values = numeric
                    .get(&feature)
                    .ok_or_else(|| PrepareError::MissingColumn(feature.name().to_string()))?;
                bins.bin_column(feature, values)?
            }
            FeatureKind::Categorical => data
                .categorical
                .get(&feature)
                .cloned()
                .ok_or_else(|| PrepareError::MissingColumn(feature.name().to_string()))?,
        };
        columns.push((feature, labels));
    }

    let (encoders, table) = fit_encode(&columns, &data.target)?;
    log::info!(
        "Preprocessing complete: {} rows, {} encoded columns",
        table.n_rows(),
        table.columns.len()
    );
    Ok(PreparedData {
        encoders,
        table,
        medians,
    })
}
