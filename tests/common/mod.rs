//! Synthetic patient cohorts for the integration tests.
//!
//! Each row draws a disease status first and then every measurement conditionally on
//! it, so the learned network has real dependencies to find. The cohort is written as a
//! CSV with the exact training schema.

use heartnet::predict::FormData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease";

/// Builder for a synthetic cohort with configurable size, prevalence and dirty zeros.
pub struct CohortBuilder {
    n_patients: usize,
    prevalence: f64,
    fidelity: f64,
    zero_measurements: usize,
    seed: u64,
}

impl CohortBuilder {
    pub fn new(n_patients: usize) -> Self {
        Self {
            n_patients,
            prevalence: 0.4,
            fidelity: 0.85,
            zero_measurements: 0,
            seed: 7,
        }
    }

    pub fn prevalence(mut self, prevalence: f64) -> Self {
        self.prevalence = prevalence;
        self
    }

    /// Number of rows whose RestingBP and Cholesterol are recorded as 0.
    pub fn zero_measurements(mut self, rows: usize) -> Self {
        self.zero_measurements = rows;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn csv(&self) -> String {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = String::from(HEADER);
        out.push('\n');

        for row in 0..self.n_patients {
            let sick = rng.gen_bool(self.prevalence);
            // `typical` is true when the measurement follows the patient's status.
            let mut typical = || rng.gen_bool(self.fidelity);
            let risky = |t: bool| if t { sick } else { !sick };

            let age: i64 = if risky(typical()) { 55 + (row as i64 * 7) % 24 } else { 29 + (row as i64 * 5) % 30 };
            let sex = if risky(typical()) { "M" } else if row % 3 == 0 { "M" } else { "F" };
            let chest = if risky(typical()) {
                if row % 9 == 0 { "TA" } else { "ASY" }
            } else if row % 2 == 0 {
                "ATA"
            } else {
                "NAP"
            };
            let mut bp: i64 = if risky(typical()) { 140 + (row as i64 * 3) % 40 } else { 105 + (row as i64 * 3) % 30 };
            let mut chol: i64 = if risky(typical()) { 240 + (row as i64 * 11) % 80 } else { 150 + (row as i64 * 11) % 50 };
            if row < self.zero_measurements {
                bp = 0;
                chol = 0;
            }
            let fasting = if risky(typical()) && row % 2 == 0 { "1" } else { "0" };
            let ecg = match (risky(typical()), row % 3) {
                (true, 0) => "LVH",
                (true, _) => "ST",
                (false, 0) => "ST",
                (false, _) => "Normal",
            };
            let max_hr: i64 = if risky(typical()) { 95 + (row as i64 * 13) % 50 } else { 140 + (row as i64 * 13) % 50 };
            let angina = if risky(typical()) { "Y" } else { "N" };
            let oldpeak: f64 = if risky(typical()) {
                1.0 + ((row * 3) % 25) as f64 / 10.0
            } else {
                ((row * 3) % 10) as f64 / 10.0
            };
            let slope = if risky(typical()) {
                if row % 7 == 0 { "Down" } else { "Flat" }
            } else {
                "Up"
            };

            let _ = writeln!(
                out,
                "{age},{sex},{chest},{bp},{chol},{fasting},{ecg},{max_hr},{angina},{oldpeak:.1},{slope},{}",
                u8::from(sick)
            );
        }
        out
    }

    /// Writes the cohort to a temporary CSV file.
    pub fn write(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(self.csv().as_bytes()).expect("write cohort");
        file.flush().expect("flush cohort");
        file
    }
}

/// A patient matching every risky pattern of the cohort.
pub fn high_risk_form() -> FormData {
    FormData::from_pairs([
        ("Age", "65"),
        ("Sex", "M"),
        ("ChestPainType", "ASY"),
        ("RestingBP", "150"),
        ("Cholesterol", "280"),
        ("FastingBS", "1"),
        ("RestingECG", "ST"),
        ("MaxHR", "110"),
        ("ExerciseAngina", "Y"),
        ("Oldpeak", "3.0"),
        ("ST_Slope", "Flat"),
    ])
}

/// A patient matching every healthy pattern of the cohort.
pub fn low_risk_form() -> FormData {
    FormData::from_pairs([
        ("Age", "35"),
        ("Sex", "F"),
        ("ChestPainType", "ATA"),
        ("RestingBP", "115"),
        ("Cholesterol", "180"),
        ("FastingBS", "0"),
        ("RestingECG", "Normal"),
        ("MaxHR", "175"),
        ("ExerciseAngina", "N"),
        ("Oldpeak", "0.0"),
        ("ST_Slope", "Up"),
    ])
}
