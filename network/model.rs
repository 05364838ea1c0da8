//! The persisted Bayesian network.

use super::dag::Dag;
use super::factor::Factor;
use super::NetworkError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tolerance on the row sums of a conditional probability table.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// One variable with its conditional probability table.
///
/// `table` holds one row per parent configuration, enumerated with the first parent
/// varying slowest and the last parent fastest. Each row is a distribution over
/// `states`. A node without parents has exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub states: Vec<String>,
    pub parents: Vec<String>,
    pub table: Vec<Vec<f64>>,
}

/// A discrete Bayesian network. Immutable once built; node order is the column order of
/// the training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianNetwork {
    nodes: Vec<Node>,
}

impl BayesianNetwork {
    pub fn new(nodes: Vec<Node>) -> Result<Self, NetworkError> {
        let network = Self { nodes };
        network.validate()?;
        Ok(network)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    pub fn cardinality(&self, index: usize) -> usize {
        self.nodes[index].states.len()
    }

    pub fn parent_indices(&self, index: usize) -> Result<Vec<usize>, NetworkError> {
        self.nodes[index]
            .parents
            .iter()
            .map(|name| {
                self.node_index(name)
                    .ok_or_else(|| NetworkError::UnknownNode(name.clone()))
            })
            .collect()
    }

    pub fn dag(&self) -> Result<Dag, NetworkError> {
        let mut dag = Dag::empty(self.n_nodes());
        for child in 0..self.n_nodes() {
            for parent in self.parent_indices(child)? {
                dag.add_edge(parent, child)?;
            }
        }
        Ok(dag)
    }

    /// Edges as `(parent, child)` name pairs, ordered by child then parent position.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.parents
                    .iter()
                    .map(move |parent| (parent.as_str(), node.name.as_str()))
            })
            .collect()
    }

    /// The CPD of node `index` as a factor over its parents followed by itself.
    pub fn cpd_factor(&self, index: usize) -> Result<Factor, NetworkError> {
        let mut vars = self.parent_indices(index)?;
        vars.push(index);
        let cards: Vec<usize> = vars.iter().map(|&v| self.cardinality(v)).collect();
        let values: Vec<f64> = self.nodes[index].table.iter().flatten().copied().collect();
        Factor::new(vars, &cards, values)
    }

    /// Checks names, parent references, acyclicity, and every table's shape and rows.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(node.name.as_str()) {
                return Err(NetworkError::InvalidTable {
                    node: node.name.clone(),
                    reason: "duplicate node name".to_string(),
                });
            }
            if node.states.is_empty() {
                return Err(NetworkError::ZeroCardinality(node.name.clone()));
            }
        }

        self.dag()?;

        for (index, node) in self.nodes.iter().enumerate() {
            let expected_rows: usize = self
                .parent_indices(index)?
                .iter()
                .map(|&p| self.cardinality(p))
                .product();
            if node.table.len() != expected_rows {
                return Err(NetworkError::InvalidTable {
                    node: node.name.clone(),
                    reason: format!(
                        "{} rows for {} parent configurations",
                        node.table.len(),
                        expected_rows
                    ),
                });
            }
            for row in &node.table {
                if row.len() != node.states.len() {
                    return Err(NetworkError::InvalidTable {
                        node: node.name.clone(),
                        reason: format!("row of length {} for {} states", row.len(), node.states.len()),
                    });
                }
                if row.iter().any(|p| !(0.0..=1.0).contains(p)) {
                    return Err(NetworkError::InvalidTable {
                        node: node.name.clone(),
                        reason: "probability outside [0, 1]".to_string(),
                    });
                }
                let total: f64 = row.iter().sum();
                if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(NetworkError::InvalidTable {
                        node: node.name.clone(),
                        reason: format!("row sums to {total}"),
                    });
                }
            }
        }
        Ok(())
    }
}
