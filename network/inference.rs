//! Exact inference by variable elimination.
//!
//! A query proceeds in four steps:
//! 1. nodes that are neither queried, observed, nor an ancestor of either are pruned;
//! 2. the remaining CPD factors are reduced by the evidence;
//! 3. hidden variables are summed out one at a time in a greedy order;
//! 4. the surviving factors are multiplied and normalized.
//!
//! Every choice is made by node index, so repeating a query reproduces the same
//! floating-point operations and therefore a bit-identical posterior.

use super::NetworkError;
use super::factor::Factor;
use super::model::BayesianNetwork;
use crate::config::EliminationHeuristic;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Variable '{0}' is not part of the network.")]
    UnknownVariable(String),
    #[error("Variable '{0}' cannot be both queried and observed.")]
    EvidenceOnQuery(String),
    #[error("State {state} is out of range for '{variable}' ({cardinality} states).")]
    StateOutOfRange {
        variable: String,
        state: usize,
        cardinality: usize,
    },
    #[error("The evidence has zero probability under the model.")]
    ZeroProbabilityEvidence,
    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub struct VariableElimination<'a> {
    network: &'a BayesianNetwork,
    heuristic: EliminationHeuristic,
}

impl<'a> VariableElimination<'a> {
    pub fn new(network: &'a BayesianNetwork, heuristic: EliminationHeuristic) -> Self {
        Self { network, heuristic }
    }

    /// Posterior distribution of `variable` given `evidence` (node name -> state code).
    ///
    /// Empty evidence yields the prior marginal.
    pub fn query(
        &self,
        variable: &str,
        evidence: &BTreeMap<String, usize>,
    ) -> Result<Vec<f64>, InferenceError> {
        let target = self
            .network
            .node_index(variable)
            .ok_or_else(|| InferenceError::UnknownVariable(variable.to_string()))?;

        let mut observed: BTreeMap<usize, usize> = BTreeMap::new();
        for (name, &state) in evidence {
            let index = self
                .network
                .node_index(name)
                .ok_or_else(|| InferenceError::UnknownVariable(name.clone()))?;
            if index == target {
                return Err(InferenceError::EvidenceOnQuery(name.clone()));
            }
            let cardinality = self.network.cardinality(index);
            if state >= cardinality {
                return Err(InferenceError::StateOutOfRange {
                    variable: name.clone(),
                    state,
                    cardinality,
                });
            }
            observed.insert(index, state);
        }
        if observed.is_empty() {
            log::debug!("Querying '{variable}' without evidence; returning the prior marginal");
        }

        let dag = self.network.dag()?;
        let roots: Vec<usize> = std::iter::once(target).chain(observed.keys().copied()).collect();
        let relevant = dag.ancestral_set(&roots);

        let mut factors = Vec::new();
        let mut hidden = BTreeSet::new();
        for node in (0..self.network.n_nodes()).filter(|&n| relevant[n]) {
            let mut factor = self.network.cpd_factor(node)?;
            for (&var, &state) in &observed {
                factor = factor.reduce(var, state)?;
            }
            factors.push(factor);
            if node != target && !observed.contains_key(&node) {
                hidden.insert(node);
            }
        }

        while let Some(var) = self.next_to_eliminate(&hidden, &factors) {
            hidden.remove(&var);
            let (touching, rest): (Vec<Factor>, Vec<Factor>) =
                factors.into_iter().partition(|f| f.contains(var));
            factors = rest;
            if let Some(joint) = multiply_all(touching) {
                factors.push(joint.marginalize(var));
            }
        }

        let joint = multiply_all(factors).ok_or(InferenceError::ZeroProbabilityEvidence)?;
        let posterior = joint
            .normalize()
            .ok_or(InferenceError::ZeroProbabilityEvidence)?;
        Ok(posterior.values().iter().copied().collect())
    }

    /// Picks the hidden variable with the lowest cost under the configured heuristic,
    /// breaking ties by the lower node index.
    fn next_to_eliminate(&self, hidden: &BTreeSet<usize>, factors: &[Factor]) -> Option<usize> {
        let mut best: Option<(u128, usize)> = None;
        for &var in hidden {
            let cost = self.cost(var, factors);
            if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                best = Some((cost, var));
            }
        }
        best.map(|(_, var)| var)
    }

    fn cost(&self, var: usize, factors: &[Factor]) -> u128 {
        let neighbours: BTreeSet<usize> = factors
            .iter()
            .filter(|f| f.contains(var))
            .flat_map(|f| f.vars().iter().copied())
            .filter(|&v| v != var)
            .collect();
        match self.heuristic {
            EliminationHeuristic::MinNeighbors => neighbours.len() as u128,
            EliminationHeuristic::MinWeight => neighbours
                .iter()
                .map(|&v| self.network.cardinality(v) as u128)
                .fold(1u128, u128::saturating_mul),
            EliminationHeuristic::MinFill => {
                let adjacent = |a: usize, b: usize| {
                    factors.iter().any(|f| f.contains(a) && f.contains(b))
                };
                let list: Vec<usize> = neighbours.into_iter().collect();
                let mut fill = 0u128;
                for (i, &a) in list.iter().enumerate() {
                    for &b in &list[i + 1..] {
                        if !adjacent(a, b) {
                            fill += 1;
                        }
                    }
                }
                fill
            }
        }
    }
}

fn multiply_all(factors: Vec<Factor>) -> Option<Factor> {
    factors.into_iter().reduce(|acc, f| acc.product(&f))
}
