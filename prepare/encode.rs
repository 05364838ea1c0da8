//! # Label Encoding
//!
//! Each column (binned numeric features, categorical features and the target) is mapped
//! to a contiguous integer code space. The vocabulary is the sorted set of labels seen at
//! training time, so codes are assigned alphabetically (byte-wise), never by first
//! appearance.

use crate::types::{Feature, TARGET_COLUMN};
use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Label '{label}' was not seen for column '{column}' during training.")]
    UnseenLabel { column: String, label: String },
    #[error("Code {code} is outside the vocabulary of column '{column}' ({size} labels).")]
    UnknownCode {
        column: String,
        code: usize,
        size: usize,
    },
    #[error("No encoder was fitted for column '{0}'.")]
    MissingEncoder(String),
    #[error("Column '{0}' has no labels to fit an encoder on.")]
    EmptyColumn(String),
    #[error("Column '{column}' has {found} rows, expected {expected}.")]
    RaggedColumn {
        column: String,
        found: usize,
        expected: usize,
    },
}

/// A bijection between the training labels of one column and `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(column: &str, labels: I) -> Result<Self, EncodeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: Vec<String> = labels
            .into_iter()
            .sorted_unstable()
            .dedup()
            .map(str::to_string)
            .collect();
        if classes.is_empty() {
            return Err(EncodeError::EmptyColumn(column.to_string()));
        }
        Ok(Self {
            column: column.to_string(),
            classes,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct labels, i.e. the cardinality of the encoded variable.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: &str) -> Result<usize, EncodeError> {
        self.classes
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .map_err(|_| EncodeError::UnseenLabel {
                column: self.column.clone(),
                label: label.to_string(),
            })
    }

    pub fn inverse_transform(&self, code: usize) -> Result<&str, EncodeError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| EncodeError::UnknownCode {
                column: self.column.clone(),
                code,
                size: self.classes.len(),
            })
    }
}

/// One encoder per feature plus one for the target, keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderBank {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderBank {
    pub fn feature(&self, feature: Feature) -> Result<&LabelEncoder, EncodeError> {
        self.column(feature.name())
    }

    pub fn target(&self) -> Result<&LabelEncoder, EncodeError> {
        self.column(TARGET_COLUMN)
    }

    pub fn column(&self, name: &str) -> Result<&LabelEncoder, EncodeError> {
        self.encoders
            .get(name)
            .ok_or_else(|| EncodeError::MissingEncoder(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

/// An integer-coded table ready for resampling and network learning.
///
/// Columns are the features in dataset order followed by the target, which is always
/// the last column.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    pub columns: Vec<String>,
    /// Number of states of every column, taken from the fitted encoders.
    pub cardinalities: Vec<usize>,
    /// Shape: `[n_rows, n_columns]`.
    pub data: Array2<usize>,
}

impl EncodedTable {
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn target_index(&self) -> usize {
        self.columns.len() - 1
    }

    /// Counts rows per target code.
    pub fn class_counts(&self) -> Vec<usize> {
        let target = self.target_index();
        let mut counts = vec![0; self.cardinalities[target]];
        for &code in self.data.column(target) {
            counts[code] += 1;
        }
        counts
    }
}

/// Fits one encoder per labelled column and encodes the whole table.
///
/// `columns` holds the string labels of every feature (already binned for numeric ones)
/// in table order; `target` holds the target labels.
pub fn fit_encode(
    columns: &[(Feature, Vec<String>)],
    target: &[String],
) -> Result<(EncoderBank, EncodedTable), EncodeError> {
    let n_rows = target.len();
    let n_cols = columns.len() + 1;

    let mut encoders = BTreeMap::new();
    let mut names = Vec::with_capacity(n_cols);
    let mut cardinalities = Vec::with_capacity(n_cols);
    let mut data = Array2::<usize>::zeros((n_rows, n_cols));

    let labelled = columns
        .iter()
        .map(|(feature, labels)| (feature.name(), labels.as_slice()))
        .chain(std::iter::once((TARGET_COLUMN, target)));

    for (col_idx, (name, labels)) in labelled.enumerate() {
        if labels.len() != n_rows {
            return Err(EncodeError::RaggedColumn {
                column: name.to_string(),
                found: labels.len(),
                expected: n_rows,
            });
        }
        let encoder = LabelEncoder::fit(name, labels.iter().map(String::as_str))?;
        for (row, label) in labels.iter().enumerate() {
            data[[row, col_idx]] = encoder.transform(label)?;
        }
        log::debug!("Encoded '{}' with classes [{}]", name, encoder.classes().iter().join(", "));
        names.push(name.to_string());
        cardinalities.push(encoder.len());
        encoders.insert(name.to_string(), encoder);
    }

    Ok((
        EncoderBank { encoders },
        EncodedTable {
            columns: names,
            cardinalities,
            data,
        },
    ))
}
