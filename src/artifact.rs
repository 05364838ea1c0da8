//! The single persisted bundle shared by the trainer and the predictor.
//!
//! Everything needed to reproduce training-time preprocessing at inference time lives
//! here: the bin definitions, the fitted encoders, the canonical feature order, the
//! configuration the model was trained with, and the network itself. The file is plain
//! TOML so that a trained model can be inspected by hand.

use crate::config::TrainingConfig;
use crate::network::{BayesianNetwork, NetworkError};
use crate::prepare::discretize::{BinError, Discretizer};
use crate::prepare::encode::{EncodeError, EncoderBank};
use crate::types::{Feature, TARGET_COLUMN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Model file contains invalid bin definitions: {0}")]
    Bins(#[from] BinError),
    #[error("Model file contains an invalid network: {0}")]
    Network(#[from] NetworkError),
    #[error("Model file is inconsistent: {0}")]
    Encoders(#[from] EncodeError),
    #[error("Model file is inconsistent: {0}")]
    Inconsistent(String),
}

/// The trained model together with its preprocessing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPackage {
    pub config: TrainingConfig,
    /// Canonical feature order: numeric features first, then categorical ones.
    pub all_features: Vec<Feature>,
    pub bins: Discretizer,
    pub encoders: EncoderBank,
    pub network: BayesianNetwork,
}

impl ModelPackage {
    /// Saves the package as a human-readable TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates a package written by [`ModelPackage::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let toml_string = fs::read_to_string(path)?;
        let package: Self = toml::from_str(&toml_string)?;
        package.validate()?;
        Ok(package)
    }

    /// Checks that the bins, encoders and network agree with each other.
    ///
    /// Deserialization bypasses the constructors, so a loaded package is only trusted
    /// after this passes.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.bins.validate()?;
        self.network.validate()?;

        if self.all_features != Feature::canonical_order() {
            return Err(ArtifactError::Inconsistent(format!(
                "feature list {:?} is not the canonical eleven features",
                self.all_features
            )));
        }

        for name in self
            .all_features
            .iter()
            .map(|f| f.name())
            .chain(std::iter::once(TARGET_COLUMN))
        {
            let encoder = self.encoders.column(name)?;
            let index = self.network.node_index(name).ok_or_else(|| {
                ArtifactError::Inconsistent(format!("network has no node for '{name}'"))
            })?;
            if self.network.nodes()[index].states.as_slice() != encoder.classes() {
                return Err(ArtifactError::Inconsistent(format!(
                    "states of node '{name}' differ from its encoder classes"
                )));
            }
        }
        Ok(())
    }
}
