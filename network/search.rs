//! Greedy hill-climbing structure search with a tabu list.
//!
//! Starting from the empty graph, every iteration evaluates all legal single-edge
//! operations (add, remove, flip), applies the one with the largest score improvement
//! and records it in the tabu list so that it is not immediately undone. The search
//! stops when no operation improves the score by more than `epsilon` or when the
//! iteration cap is reached.
//!
//! Candidate operations are enumerated in a fixed order (additions by source then
//! target, then removals, then flips) and the first best candidate wins, so the learned
//! structure is a deterministic function of the data.

use super::dag::Dag;
use super::score::StructureScore;
use crate::config::StructureConfig;
use ahash::AHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add(usize, usize),
    Remove(usize, usize),
    Flip(usize, usize),
}

impl Operation {
    /// The operation that would undo this one, which the tabu list forbids.
    fn inverse(self) -> Operation {
        match self {
            Operation::Add(u, v) => Operation::Remove(u, v),
            Operation::Remove(u, v) => Operation::Add(u, v),
            Operation::Flip(u, v) => Operation::Flip(v, u),
        }
    }
}

pub struct HillClimbSearch<'a> {
    score: &'a dyn StructureScore,
    n_nodes: usize,
    config: &'a StructureConfig,
    cache: AHashMap<(usize, Vec<usize>), f64>,
}

impl<'a> HillClimbSearch<'a> {
    pub fn new(score: &'a dyn StructureScore, n_nodes: usize, config: &'a StructureConfig) -> Self {
        Self {
            score,
            n_nodes,
            config,
            cache: AHashMap::new(),
        }
    }

    fn local(&mut self, variable: usize, parents: &[usize]) -> f64 {
        let key = (variable, parents.to_vec());
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        let value = self.score.local_score(variable, parents);
        self.cache.insert(key, value);
        value
    }

    fn indegree_allows(&self, current: usize) -> bool {
        self.config.max_indegree.is_none_or(|max| current < max)
    }

    /// Score change of `op` applied to `dag`, or `None` if the operation is illegal.
    fn delta(&mut self, dag: &Dag, op: Operation, tabu: &VecDeque<Operation>) -> Option<f64> {
        if tabu.contains(&op.inverse()) {
            return None;
        }
        match op {
            Operation::Add(u, v) => {
                if dag.has_edge(u, v)
                    || dag.has_edge(v, u)
                    || dag.has_path(v, u)
                    || !self.indegree_allows(dag.parents(v).len())
                {
                    return None;
                }
                let old = dag.parents(v).to_vec();
                let new = with_parent(&old, u);
                Some(self.local(v, &new) - self.local(v, &old))
            }
            Operation::Remove(u, v) => {
                let old = dag.parents(v).to_vec();
                let new = without_parent(&old, u);
                Some(self.local(v, &new) - self.local(v, &old))
            }
            Operation::Flip(u, v) => {
                if dag.has_indirect_path(u, v) || !self.indegree_allows(dag.parents(u).len()) {
                    return None;
                }
                let old_u = dag.parents(u).to_vec();
                let new_u = with_parent(&old_u, v);
                let old_v = dag.parents(v).to_vec();
                let new_v = without_parent(&old_v, u);
                Some(
                    self.local(u, &new_u) - self.local(u, &old_u) + self.local(v, &new_v)
                        - self.local(v, &old_v),
                )
            }
        }
    }

    fn candidates(&self, dag: &Dag) -> Vec<Operation> {
        let mut ops = Vec::new();
        for u in 0..self.n_nodes {
            for v in 0..self.n_nodes {
                if u != v {
                    ops.push(Operation::Add(u, v));
                }
            }
        }
        let edges = dag.edges();
        ops.extend(edges.iter().map(|&(u, v)| Operation::Remove(u, v)));
        ops.extend(edges.iter().map(|&(u, v)| Operation::Flip(u, v)));
        ops
    }

    /// Runs the search and returns the learned graph.
    pub fn estimate(&mut self) -> Dag {
        let mut dag = Dag::empty(self.n_nodes);
        let mut tabu: VecDeque<Operation> = VecDeque::with_capacity(self.config.tabu_length);

        for iteration in 0..self.config.max_iter {
            let mut best: Option<(Operation, f64)> = None;
            for op in self.candidates(&dag) {
                if let Some(delta) = self.delta(&dag, op, &tabu) {
                    if best.is_none_or(|(_, best_delta)| delta > best_delta) {
                        best = Some((op, delta));
                    }
                }
            }

            let Some((op, delta)) = best else {
                log::debug!("No legal operation left after {iteration} iterations");
                break;
            };
            if delta < self.config.epsilon {
                log::debug!(
                    "Converged after {iteration} iterations (best delta {delta:.6e})"
                );
                break;
            }

            match op {
                Operation::Add(u, v) => insert_edge(&mut dag, u, v),
                Operation::Remove(u, v) => dag.remove_edge(u, v),
                Operation::Flip(u, v) => {
                    dag.remove_edge(u, v);
                    insert_edge(&mut dag, v, u);
                }
            }
            log::debug!("Iteration {iteration}: applied {op:?} (delta {delta:.4})");

            if self.config.tabu_length > 0 {
                if tabu.len() == self.config.tabu_length {
                    tabu.pop_front();
                }
                tabu.push_back(op);
            }
        }

        log::info!(
            "Structure search finished with {} edges ({} local scores evaluated)",
            dag.n_edges(),
            self.cache.len()
        );
        dag
    }
}

/// Applies an edge that `delta` has already proven legal.
fn insert_edge(dag: &mut Dag, from: usize, to: usize) {
    if let Err(err) = dag.add_edge(from, to) {
        log::error!("Rejected an edge the search considered legal: {err}");
    }
}

fn with_parent(parents: &[usize], extra: usize) -> Vec<usize> {
    let mut out = parents.to_vec();
    if let Err(pos) = out.binary_search(&extra) {
        out.insert(pos, extra);
    }
    out
}

fn without_parent(parents: &[usize], removed: usize) -> Vec<usize> {
    parents.iter().copied().filter(|&p| p != removed).collect()
}
