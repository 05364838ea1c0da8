//! # Data Loading and Validation Module
//!
//! This module is the exclusive entry point for the raw training table. It reads a
//! comma-separated file, validates it against the fixed heart-disease schema and
//! returns plain column vectors for the preprocessing pipeline.
//!
//! - Strict Schema: Column names are not configurable. The eleven clinical features and
//!   `HeartDisease` must be present with exactly these spellings.
//! - User-Centric Errors: Failures are assumed to be user-input errors. The `DataError`
//!   enum is designed to provide clear, actionable feedback.

use crate::types::{Feature, TARGET_COLUMN};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// The raw, validated training table.
#[derive(Debug, Clone)]
pub struct TrainingData {
    /// Numeric measurements keyed by feature, one value per row.
    pub numeric: BTreeMap<Feature, Vec<f64>>,
    /// Categorical labels keyed by feature. Integer-typed columns such as `FastingBS`
    /// are rendered as their decimal text (`"0"`, `"1"`).
    pub categorical: BTreeMap<Feature, Vec<String>>,
    /// Target labels (`"0"` / `"1"`).
    pub target: Vec<String>,
}

impl TrainingData {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }
}

/// A comprehensive error type for all data loading and validation failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error(
        "The required column '{column_name}' could not be converted to the expected type '{expected_type}'. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error(
        "Missing or null values were found in the required column '{0}'. This tool requires complete data with no missing values."
    )]
    MissingValuesFound(String),
    #[error(
        "Input file contains only {found} data rows, but at least {required} are required to learn a network."
    )]
    InsufficientRows { found: usize, required: usize },
    #[error(
        "Non-finite values (NaN or Infinity) were found in the required column '{0}'. This tool requires all data to be finite."
    )]
    NonFiniteValuesFound(String),
}

/// Loads and validates the training table.
pub fn load_training_data(path: impl AsRef<Path>) -> Result<TrainingData, DataError> {
    internal::load(path.as_ref())
}

/// Internal module for shared data loading logic.
mod internal {
    use super::*;

    pub(super) const MINIMUM_ROWS: usize = 20;

    fn validate_is_finite(values: &[f64], column_name: &str) -> Result<(), DataError> {
        if values.iter().any(|&v| !v.is_finite()) {
            return Err(DataError::NonFiniteValuesFound(column_name.to_string()));
        }
        Ok(())
    }

    fn extract_numeric_column(df: &DataFrame, column_name: &str) -> Result<Vec<f64>, DataError> {
        let series = df.column(column_name)?;
        if series.null_count() > 0 {
            return Err(DataError::MissingValuesFound(column_name.to_string()));
        }

        let casted = match series.cast(&DataType::Float64) {
            Ok(casted) => casted,
            Err(_) => {
                return Err(DataError::ColumnWrongType {
                    column_name: column_name.to_string(),
                    expected_type: "f64 (numeric)",
                    found_type: format!("{:?}", series.dtype()),
                });
            }
        };

        if casted.null_count() > 0 {
            return Err(DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                expected_type: "f64 (numeric)",
                found_type: format!("{:?}", series.dtype()),
            });
        }

        let chunked = casted.f64()?.rechunk();
        let values: Vec<f64> = chunked.into_no_null_iter().collect();
        validate_is_finite(&values, column_name)?;
        Ok(values)
    }

    fn extract_label_column(df: &DataFrame, column_name: &str) -> Result<Vec<String>, DataError> {
        let series = df.column(column_name)?;
        if series.null_count() > 0 {
            return Err(DataError::MissingValuesFound(column_name.to_string()));
        }

        // Integral codes stored as floats would otherwise render as "1.0".
        let series = if series.dtype().is_float() {
            series.cast(&DataType::Int64)?
        } else {
            series.clone()
        };

        let casted = series
            .cast(&DataType::String)
            .map_err(|_| DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                expected_type: "string (categorical)",
                found_type: format!("{:?}", series.dtype()),
            })?;

        casted
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(str::to_string)
                    .ok_or_else(|| DataError::MissingValuesFound(column_name.to_string()))
            })
            .collect()
    }

    pub(super) fn load(path: &Path) -> Result<TrainingData, DataError> {
        let mut required_cols: Vec<&str> =
            Feature::DATASET_ORDER.iter().map(|f| f.name()).collect();
        required_cols.push(TARGET_COLUMN);

        log::info!("Loading training data from '{}'", path.display());

        let df = CsvReader::new(File::open(path)?)
            .with_options(
                CsvReadOptions::default()
                    .with_has_header(true)
                    .with_parse_options(CsvParseOptions::default().with_separator(b',')),
            )
            .finish()?;

        if df.height() < MINIMUM_ROWS {
            return Err(DataError::InsufficientRows {
                found: df.height(),
                required: MINIMUM_ROWS,
            });
        }

        let columns_set: HashSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        for col_name in &required_cols {
            if !columns_set.contains(*col_name) {
                return Err(DataError::ColumnNotFound(col_name.to_string()));
            }
        }
        log::debug!("All required columns found: {required_cols:?}");

        let mut numeric = BTreeMap::new();
        for feature in Feature::NUMERIC {
            numeric.insert(feature, extract_numeric_column(&df, feature.name())?);
        }

        let mut categorical = BTreeMap::new();
        for feature in Feature::CATEGORICAL {
            categorical.insert(feature, extract_label_column(&df, feature.name())?);
        }

        let target = extract_label_column(&df, TARGET_COLUMN)?;

        log::info!("Loaded {} patient records.", target.len());
        Ok(TrainingData {
            numeric,
            categorical,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    const HEADER: &str = "Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease";
    const ROW: &str = "54,M,ASY,140,239,0,Normal,160,N,1.2,Flat,1";

    fn create_test_csv(content: &str) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", content)?;
        file.flush()?;
        Ok(file)
    }

    fn generate_csv_content(header: &str, data_row: &str, num_rows: usize) -> String {
        let data_rows = std::iter::repeat(data_row)
            .take(num_rows)
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", header, data_rows)
    }

    #[test]
    fn test_load_training_data_success() {
        let mut rows = vec![HEADER.to_string()];
        for i in 0..25 {
            rows.push(format!(
                "{},{},ATA,{},{},{},Normal,{},N,{:.1},Up,{}",
                40 + i,
                if i % 2 == 0 { "M" } else { "F" },
                120 + i,
                200 + 2 * i,
                i % 2,
                150 - i,
                i as f64 / 10.0,
                i % 2
            ));
        }
        let file = create_test_csv(&rows.join("\n")).unwrap();
        let data = load_training_data(file.path()).unwrap();

        assert_eq!(data.n_rows(), 25);
        assert_abs_diff_eq!(data.numeric[&Feature::Age][3], 43.0, epsilon = 1e-12);
        assert_abs_diff_eq!(data.numeric[&Feature::Oldpeak][5], 0.5, epsilon = 1e-12);
        assert_eq!(data.categorical[&Feature::Sex][1], "F");
        assert_eq!(data.categorical[&Feature::FastingBs][1], "1");
        assert_eq!(data.target[0], "0");
        assert_eq!(data.target[1], "1");
    }

    #[test]
    fn test_error_column_not_found() {
        let header = HEADER.replace(",ST_Slope", "");
        let row = ROW.replace(",Flat", "");
        let file = create_test_csv(&generate_csv_content(&header, &row, 30)).unwrap();
        match load_training_data(file.path()).unwrap_err() {
            DataError::ColumnNotFound(col) => assert_eq!(col, "ST_Slope"),
            other => panic!("Expected ColumnNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_error_missing_values() {
        let row = "54,M,ASY,,239,0,Normal,160,N,1.2,Flat,1";
        let file = create_test_csv(&generate_csv_content(HEADER, row, 30)).unwrap();
        match load_training_data(file.path()).unwrap_err() {
            DataError::MissingValuesFound(col) => assert_eq!(col, "RestingBP"),
            other => panic!("Expected MissingValuesFound, got {:?}", other),
        }
    }

    #[test]
    fn test_error_wrong_type() {
        let row = "old,M,ASY,140,239,0,Normal,160,N,1.2,Flat,1";
        let file = create_test_csv(&generate_csv_content(HEADER, row, 30)).unwrap();
        match load_training_data(file.path()).unwrap_err() {
            DataError::ColumnWrongType { column_name, .. } => assert_eq!(column_name, "Age"),
            other => panic!("Expected ColumnWrongType, got {:?}", other),
        }
    }

    #[test]
    fn test_error_insufficient_rows() {
        let file = create_test_csv(&generate_csv_content(HEADER, ROW, 5)).unwrap();
        match load_training_data(file.path()).unwrap_err() {
            DataError::InsufficientRows { found, required } => {
                assert_eq!(found, 5);
                assert_eq!(required, 20);
            }
            other => panic!("Expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_training_data("definitely/not/here/heart.csv").unwrap_err();
        assert!(matches!(err, DataError::IoError(_)));
    }
}
