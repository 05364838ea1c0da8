//! # Prediction
//!
//! Converts a raw form submission into the training-time representation, queries the
//! network for the posterior of the positive class and reports it with a list of
//! contributing risk factors.

pub mod evidence;
pub mod form;
pub mod reasons;
pub mod risk;

pub use form::FormData;
pub use risk::{PredictionResponse, Predictor, RiskAssessment, RiskBand};

use crate::artifact::ArtifactError;
use crate::network::InferenceError;
use crate::prepare::discretize::BinError;
use crate::prepare::encode::EncodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("field '{field}' has the invalid number '{value}'")]
    InvalidNumber { field: String, value: String },
    #[error("expected FIELD=VALUE but got '{0}'")]
    MalformedAssignment(String),
    #[error("{0}")]
    Bin(#[from] BinError),
    #[error("{0}")]
    Encode(#[from] EncodeError),
    #[error("{0}")]
    Inference(#[from] InferenceError),
    #[error("the posterior has no entry for the positive class")]
    MissingPositiveState,
    #[error("{0}")]
    Artifact(#[from] ArtifactError),
}
