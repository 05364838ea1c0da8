//! # Bayesian Network Learning and Inference
//!
//! Structure learning (hill climbing over decomposable scores), parameter estimation
//! (BDeu-smoothed counts) and exact inference (variable elimination) over discrete,
//! integer-coded data.

pub mod dag;
pub mod estimate;
pub mod factor;
pub mod inference;
pub mod math;
pub mod model;
pub mod score;
pub mod search;

pub use inference::{InferenceError, VariableElimination};
pub use model::{BayesianNetwork, Node};

use crate::config::{EstimatorConfig, StructureConfig};
use crate::prepare::encode::{EncodeError, EncodedTable, EncoderBank};
use itertools::Itertools;
use search::HillClimbSearch;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Node index {node} is out of range for a graph of {n_nodes} nodes.")]
    NodeOutOfRange { node: usize, n_nodes: usize },
    #[error("Edge {from} -> {to} would create a self-loop, duplicate or cycle.")]
    InvalidEdge { from: usize, to: usize },
    #[error("Cannot learn a network from a table with no rows.")]
    EmptyData,
    #[error("Column '{0}' has no states.")]
    ZeroCardinality(String),
    #[error("The table of node {node} would exceed {limit} cells.")]
    TableTooLarge { node: usize, limit: usize },
    #[error("Node '{0}' is referenced but not defined.")]
    UnknownNode(String),
    #[error("State {state} is out of range for node {node} ({cardinality} states).")]
    StateOutOfRange {
        node: usize,
        state: usize,
        cardinality: usize,
    },
    #[error("Invalid conditional probability table for '{node}': {reason}")]
    InvalidTable { node: String, reason: String },
    #[error("Column '{column}' has {encoded} encoded states but {labels} labels.")]
    ColumnMismatch {
        column: String,
        encoded: usize,
        labels: usize,
    },
    #[error("Factor shape error: {0}")]
    Shape(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Learns structure and parameters from an encoded (and usually rebalanced) table.
///
/// Every column becomes a node, including columns the search leaves unconnected.
pub fn learn_network(
    table: &EncodedTable,
    encoders: &EncoderBank,
    structure: &StructureConfig,
    estimator: &EstimatorConfig,
) -> Result<BayesianNetwork, NetworkError> {
    if table.n_rows() == 0 {
        return Err(NetworkError::EmptyData);
    }
    if let Some(index) = table.cardinalities.iter().position(|&c| c == 0) {
        return Err(NetworkError::ZeroCardinality(table.columns[index].clone()));
    }

    log::info!(
        "Learning structure over {} variables from {} rows ({:?} score)",
        table.columns.len(),
        table.n_rows(),
        structure.scoring
    );
    let score = score::build_score(structure, table.data.view(), &table.cardinalities);
    let dag = HillClimbSearch::new(score.as_ref(), table.columns.len(), structure).estimate();

    log::info!(
        "Learned edges: [{}]",
        dag.edges()
            .iter()
            .map(|&(from, to)| format!("{} -> {}", table.columns[from], table.columns[to]))
            .join(", ")
    );

    estimate::fit_parameters(table, encoders, &dag, estimator)
}
