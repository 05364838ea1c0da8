//! Risk scoring for a single patient.

use super::PredictError;
use super::evidence::{Evidence, build_evidence};
use super::form::FormData;
use super::reasons::NO_REASONS_MESSAGE;
use crate::artifact::ModelPackage;
use crate::network::VariableElimination;
use crate::types::{POSITIVE_TARGET_LABEL, TARGET_COLUMN};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Coarse category of a risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// `> 70` is high, `> 40` is medium, anything else is low.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > 70.0 {
            RiskBand::High
        } else if percentage > 40.0 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        };
        f.write_str(name)
    }
}

/// The full outcome of a successful assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Posterior probability of the positive class.
    pub probability: f64,
    /// `probability * 100`, rounded to two decimals.
    pub risk_percentage: f64,
    pub band: RiskBand,
    pub reasons: Vec<String>,
    pub evidence: Evidence,
}

/// What the caller shows to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictionResponse {
    Success {
        risk_percentage: f64,
        band: RiskBand,
        reasons: Vec<String>,
    },
    Failure {
        message: String,
    },
}

impl fmt::Display for PredictionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionResponse::Success {
                risk_percentage,
                band,
                reasons,
            } => {
                writeln!(f, "Risk of heart disease: {risk_percentage:.2}% ({band})")?;
                for reason in reasons {
                    writeln!(f, "  - {reason}")?;
                }
                Ok(())
            }
            PredictionResponse::Failure { message } => writeln!(f, "{message}"),
        }
    }
}

/// Serves predictions from a loaded model. Holds no per-request state, so one instance
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct Predictor {
    package: ModelPackage,
    positive_state: usize,
}

impl Predictor {
    pub fn new(package: ModelPackage) -> Result<Self, PredictError> {
        let positive_state = package.encoders.target()?.transform(POSITIVE_TARGET_LABEL)?;
        Ok(Self {
            package,
            positive_state,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictError> {
        Self::new(ModelPackage::load(path)?)
    }

    pub fn package(&self) -> &ModelPackage {
        &self.package
    }

    /// Scores one form, propagating any failure.
    pub fn assess(&self, form: &FormData) -> Result<RiskAssessment, PredictError> {
        let evidence = build_evidence(form, &self.package)?;
        let engine =
            VariableElimination::new(&self.package.network, self.package.config.inference.elimination);
        let posterior = engine.query(TARGET_COLUMN, &evidence.encoded)?;
        let probability = posterior
            .get(self.positive_state)
            .copied()
            .ok_or(PredictError::MissingPositiveState)?;
        let risk_percentage = round_percentage(probability);
        log::info!("Risk probability {probability} ({risk_percentage}%)");

        Ok(RiskAssessment {
            probability,
            risk_percentage,
            band: RiskBand::from_percentage(risk_percentage),
            reasons: evidence.reasons.clone(),
            evidence,
        })
    }

    /// Scores one form and converts the outcome into a user-facing response. Errors
    /// become a failure message; they never escape.
    pub fn predict(&self, form: &FormData) -> PredictionResponse {
        match self.assess(form) {
            Ok(assessment) => {
                let reasons = if assessment.reasons.is_empty() {
                    vec![NO_REASONS_MESSAGE.to_string()]
                } else {
                    assessment.reasons
                };
                PredictionResponse::Success {
                    risk_percentage: assessment.risk_percentage,
                    band: assessment.band,
                    reasons,
                }
            }
            Err(err) => {
                log::error!("Prediction failed: {err}");
                PredictionResponse::Failure {
                    message: format!(
                        "An error occurred: {err}. Make sure every field is filled in."
                    ),
                }
            }
        }
    }
}

fn round_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}
