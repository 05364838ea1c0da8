//! Training configuration.
//!
//! Every knob has a default matching the reference training run, so an empty (or absent)
//! configuration file reproduces it exactly. The effective configuration is written into
//! the model artifact alongside the network.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of the SMOTE-Tomek rebalancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Seed of the random generator driving synthetic sample selection.
    pub seed: u64,
    /// Number of same-class neighbours SMOTE interpolates towards.
    pub k_neighbors: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            k_neighbors: 5,
        }
    }
}

/// The decomposable score maximized by the structure search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    K2,
    Bdeu,
    Bic,
}

/// Settings of the hill-climbing structure search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    pub scoring: ScoringMethod,
    /// Equivalent sample size used when `scoring = "bdeu"`.
    pub bdeu_equivalent_sample_size: f64,
    /// Number of recently applied operations that may not be undone.
    pub tabu_length: usize,
    /// Upper bound on the number of parents of any node.
    pub max_indegree: Option<usize>,
    /// Minimum score improvement for an operation to be applied.
    pub epsilon: f64,
    pub max_iter: usize,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringMethod::K2,
            bdeu_equivalent_sample_size: 10.0,
            tabu_length: 100,
            max_indegree: None,
            epsilon: 1e-4,
            max_iter: 1_000_000,
        }
    }
}

/// Settings of the Bayesian parameter estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Total pseudo-count of the BDeu prior, spread evenly over each CPD.
    pub equivalent_sample_size: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            equivalent_sample_size: 5.0,
        }
    }
}

/// Greedy heuristic choosing the next variable to sum out during variable elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EliminationHeuristic {
    /// Fewest fill-in edges.
    #[default]
    MinFill,
    /// Fewest neighbours in the interaction graph.
    MinNeighbors,
    /// Smallest product of neighbour cardinalities.
    MinWeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferenceConfig {
    pub elimination: EliminationHeuristic,
}

/// The complete training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrainingConfig {
    pub resample: ResampleConfig,
    pub structure: StructureConfig,
    pub estimator: EstimatorConfig,
    pub inference: InferenceConfig,
}

impl TrainingConfig {
    /// Loads a configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // TOML integers are signed 64-bit; a larger seed could never be written back.
        if self.resample.seed > i64::MAX as u64 {
            return Err(ConfigError::Invalid(format!(
                "resample.seed must not exceed {}",
                i64::MAX
            )));
        }
        if self.resample.k_neighbors == 0 {
            return Err(ConfigError::Invalid(
                "resample.k_neighbors must be at least 1".to_string(),
            ));
        }
        if !(self.estimator.equivalent_sample_size > 0.0) {
            return Err(ConfigError::Invalid(
                "estimator.equivalent_sample_size must be positive".to_string(),
            ));
        }
        if !(self.structure.bdeu_equivalent_sample_size > 0.0) {
            return Err(ConfigError::Invalid(
                "structure.bdeu_equivalent_sample_size must be positive".to_string(),
            ));
        }
        if !(self.structure.epsilon >= 0.0) {
            return Err(ConfigError::Invalid(
                "structure.epsilon must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let config: TrainingConfig = toml::from_str("").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.resample.seed, 42);
        assert_eq!(config.structure.scoring, ScoringMethod::K2);
        assert_eq!(config.inference.elimination, EliminationHeuristic::MinFill);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[structure]\nscoring = \"bic\"\nmax_indegree = 3\n\n[inference]\nelimination = \"min-weight\""
        )
        .unwrap();
        let config = TrainingConfig::load(file.path()).unwrap();
        assert_eq!(config.structure.scoring, ScoringMethod::Bic);
        assert_eq!(config.structure.max_indegree, Some(3));
        assert_eq!(config.structure.tabu_length, 100);
        assert_eq!(config.inference.elimination, EliminationHeuristic::MinWeight);
        assert_eq!(config.resample, ResampleConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[resample]\nk_neighbors = 0").unwrap();
        assert!(matches!(
            TrainingConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_seeds_toml_cannot_store() {
        let mut config = TrainingConfig::default();
        config.resample.seed = i64::MAX as u64;
        config.validate().unwrap();
        assert!(toml::to_string_pretty(&config).is_ok());

        config.resample.seed = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = TrainingConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: TrainingConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
