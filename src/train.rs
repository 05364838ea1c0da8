//! The training pipeline: raw CSV to a persisted [`ModelPackage`].

use crate::artifact::{ArtifactError, ModelPackage};
use crate::config::{ConfigError, TrainingConfig};
use crate::network::{NetworkError, learn_network};
use crate::prepare::data::{DataError, TrainingData, load_training_data};
use crate::prepare::discretize::Discretizer;
use crate::prepare::resample::{ResampleError, smote_tomek};
use crate::prepare::{PrepareError, preprocess};
use crate::types::Feature;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Failed to load training data: {0}")]
    Data(#[from] DataError),
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Preprocessing failed: {0}")]
    Prepare(#[from] PrepareError),
    #[error("Resampling failed: {0}")]
    Resample(#[from] ResampleError),
    #[error("Network learning failed: {0}")]
    Network(#[from] NetworkError),
    #[error("Failed to write the model: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Runs preprocessing, rebalancing and network learning on an in-memory table.
pub fn train(data: &TrainingData, config: &TrainingConfig) -> Result<ModelPackage, TrainError> {
    config.validate()?;
    let bins = Discretizer::default();

    let prepared = preprocess(data, &bins)?;
    log::info!(
        "Class counts before resampling: {:?}",
        prepared.table.class_counts()
    );

    let balanced = smote_tomek(&prepared.table, &config.resample)?;
    log::info!(
        "Class counts after resampling: {:?} ({} rows)",
        balanced.class_counts(),
        balanced.n_rows()
    );

    let network = learn_network(
        &balanced,
        &prepared.encoders,
        &config.structure,
        &config.estimator,
    )?;

    Ok(ModelPackage {
        config: config.clone(),
        all_features: Feature::canonical_order(),
        bins,
        encoders: prepared.encoders,
        network,
    })
}

/// Loads `data_path`, trains, and writes the package to `output_path`.
pub fn train_and_save(
    data_path: impl AsRef<Path>,
    config: &TrainingConfig,
    output_path: impl AsRef<Path>,
) -> Result<ModelPackage, TrainError> {
    let data = load_training_data(data_path)?;
    let package = train(&data, config)?;
    package.save(output_path)?;
    Ok(package)
}
