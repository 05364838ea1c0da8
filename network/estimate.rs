//! Bayesian parameter estimation with a BDeu prior.
//!
//! `P(x | pa) = (N(x, pa) + a) / (N(pa) + r * a)` with `a = ess / (r * q)`, where `r` is
//! the variable's cardinality and `q` the number of parent configurations. Parent
//! configurations never seen in the data end up with the uniform distribution.

use super::NetworkError;
use super::dag::Dag;
use super::model::{BayesianNetwork, Node};
use crate::config::EstimatorConfig;
use crate::prepare::encode::{EncodedTable, EncoderBank};
use ndarray::ArrayView2;

/// Largest number of cells a single conditional probability table may hold.
const MAX_TABLE_CELLS: usize = 1 << 24;

pub struct BayesianEstimator<'a> {
    data: ArrayView2<'a, usize>,
    cardinalities: &'a [usize],
    equivalent_sample_size: f64,
}

impl<'a> BayesianEstimator<'a> {
    pub fn new(
        data: ArrayView2<'a, usize>,
        cardinalities: &'a [usize],
        equivalent_sample_size: f64,
    ) -> Self {
        Self {
            data,
            cardinalities,
            equivalent_sample_size,
        }
    }

    /// Estimates the table of `variable` given `parents`, one row per parent
    /// configuration (last parent fastest).
    pub fn estimate_cpd(
        &self,
        variable: usize,
        parents: &[usize],
    ) -> Result<Vec<Vec<f64>>, NetworkError> {
        let r = self.cardinalities[variable];
        let q = parents
            .iter()
            .try_fold(1usize, |acc, &p| acc.checked_mul(self.cardinalities[p]))
            .filter(|&q| q.checked_mul(r).is_some_and(|cells| cells <= MAX_TABLE_CELLS))
            .ok_or(NetworkError::TableTooLarge {
                node: variable,
                limit: MAX_TABLE_CELLS,
            })?;

        let mut counts = vec![vec![0.0f64; r]; q];
        for row in self.data.rows() {
            let config = parents
                .iter()
                .fold(0usize, |acc, &p| acc * self.cardinalities[p] + row[p]);
            counts[config][row[variable]] += 1.0;
        }

        let pseudo = self.equivalent_sample_size / (r as f64 * q as f64);
        let table = counts
            .into_iter()
            .map(|cells| {
                let total: f64 = cells.iter().sum::<f64>() + r as f64 * pseudo;
                cells.into_iter().map(|n| (n + pseudo) / total).collect()
            })
            .collect();
        Ok(table)
    }
}

/// Estimates every node's table for the learned `dag` and assembles the network.
///
/// Node names come from the table columns and state names from the fitted encoders, so
/// a node's state `k` is the label encoded as `k`.
pub fn fit_parameters(
    table: &EncodedTable,
    encoders: &EncoderBank,
    dag: &Dag,
    config: &EstimatorConfig,
) -> Result<BayesianNetwork, NetworkError> {
    let estimator = BayesianEstimator::new(
        table.data.view(),
        &table.cardinalities,
        config.equivalent_sample_size,
    );

    let mut nodes = Vec::with_capacity(table.columns.len());
    for (index, name) in table.columns.iter().enumerate() {
        let states = encoders.column(name)?.classes().to_vec();
        if states.len() != table.cardinalities[index] {
            return Err(NetworkError::ColumnMismatch {
                column: name.clone(),
                encoded: table.cardinalities[index],
                labels: states.len(),
            });
        }
        let parents = dag.parents(index);
        nodes.push(Node {
            name: name.clone(),
            states,
            parents: parents.iter().map(|&p| table.columns[p].clone()).collect(),
            table: estimator.estimate_cpd(index, parents)?,
        });
    }
    BayesianNetwork::new(nodes)
}
