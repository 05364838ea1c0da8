//! Decomposable structure scores.
//!
//! A score of a whole DAG is the sum of a local score per node given its parents, so the
//! search only ever needs `local_score(variable, parents)`. Counts are gathered sparsely:
//! only parent configurations that actually occur in the data are materialized. Every
//! score below is defined so that unobserved configurations contribute exactly zero.

use super::math::ln_gamma;
use crate::config::{ScoringMethod, StructureConfig};
use ahash::AHashMap;
use ndarray::ArrayView2;

/// A decomposable score over discrete data.
pub trait StructureScore: Sync {
    /// Score contribution of `variable` given the (sorted) `parents`.
    fn local_score(&self, variable: usize, parents: &[usize]) -> f64;
}

/// Joint counts of one variable and its parents.
pub struct StateCounts {
    /// Per observed parent configuration, the count of each variable state.
    pub by_config: Vec<Vec<f64>>,
    /// Number of possible parent configurations (observed or not).
    pub n_configs: f64,
    pub cardinality: usize,
}

/// Counts the states of `variable` under every observed configuration of `parents`.
///
/// Configurations are enumerated with the last parent varying fastest and returned in
/// ascending configuration order.
pub fn state_counts(
    data: ArrayView2<usize>,
    cardinalities: &[usize],
    variable: usize,
    parents: &[usize],
) -> StateCounts {
    let cardinality = cardinalities[variable];
    let mut table: AHashMap<usize, Vec<f64>> = AHashMap::new();
    for row in data.rows() {
        let mut config = 0usize;
        for &p in parents {
            config = config * cardinalities[p] + row[p];
        }
        table.entry(config).or_insert_with(|| vec![0.0; cardinality])[row[variable]] += 1.0;
    }
    let mut observed: Vec<(usize, Vec<f64>)> = table.into_iter().collect();
    observed.sort_unstable_by_key(|(config, _)| *config);

    StateCounts {
        by_config: observed.into_iter().map(|(_, counts)| counts).collect(),
        n_configs: parents
            .iter()
            .map(|&p| cardinalities[p] as f64)
            .product(),
        cardinality,
    }
}

/// The K2 score: a Bayesian Dirichlet score with a uniform prior of one pseudo-count
/// per cell.
pub struct K2Score<'a> {
    data: ArrayView2<'a, usize>,
    cardinalities: &'a [usize],
}

impl<'a> K2Score<'a> {
    pub fn new(data: ArrayView2<'a, usize>, cardinalities: &'a [usize]) -> Self {
        Self {
            data,
            cardinalities,
        }
    }
}

impl StructureScore for K2Score<'_> {
    fn local_score(&self, variable: usize, parents: &[usize]) -> f64 {
        let counts = state_counts(self.data, self.cardinalities, variable, parents);
        let r = counts.cardinality as f64;
        let lg_r = ln_gamma(r);
        counts
            .by_config
            .iter()
            .map(|cells| {
                let n_j: f64 = cells.iter().sum();
                let cell_sum: f64 = cells.iter().map(|&n| ln_gamma(n + 1.0)).sum();
                lg_r - ln_gamma(n_j + r) + cell_sum
            })
            .sum()
    }
}

/// The BDeu score: a likelihood-equivalent Dirichlet prior spreading
/// `equivalent_sample_size` pseudo-counts uniformly over each node's table.
pub struct BDeuScore<'a> {
    data: ArrayView2<'a, usize>,
    cardinalities: &'a [usize],
    equivalent_sample_size: f64,
}

impl<'a> BDeuScore<'a> {
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
}

impl StructureScore for BDeuScore<'_> {
    fn local_score(&self, variable: usize, parents: &[usize]) -> f64 {
        let counts = state_counts(self.data, self.cardinalities, variable, parents);
        let r = counts.cardinality as f64;
        let alpha = self.equivalent_sample_size / counts.n_configs;
        let beta = alpha / r;
        let (lg_alpha, lg_beta) = (ln_gamma(alpha), ln_gamma(beta));
        counts
            .by_config
            .iter()
            .map(|cells| {
                let n_j: f64 = cells.iter().sum();
                let cell_sum: f64 = cells.iter().map(|&n| ln_gamma(n + beta) - lg_beta).sum();
                lg_alpha - ln_gamma(n_j + alpha) + cell_sum
            })
            .sum()
    }
}

/// The Bayesian information criterion: maximized log-likelihood minus
/// `0.5 * ln(N) * free parameters`.
pub struct BicScore<'a> {
    data: ArrayView2<'a, usize>,
    cardinalities: &'a [usize],
}

impl<'a> BicScore<'a> {
    pub fn new(data: ArrayView2<'a, usize>, cardinalities: &'a [usize]) -> Self {
        Self {
            data,
            cardinalities,
        }
    }
}

impl StructureScore for BicScore<'_> {
    fn local_score(&self, variable: usize, parents: &[usize]) -> f64 {
        let counts = state_counts(self.data, self.cardinalities, variable, parents);
        let n_rows = self.data.nrows() as f64;
        let log_likelihood: f64 = counts
            .by_config
            .iter()
            .map(|cells| {
                let n_j: f64 = cells.iter().sum();
                cells
                    .iter()
                    .filter(|&&n| n > 0.0)
                    .map(|&n| n * (n / n_j).ln())
                    .sum::<f64>()
            })
            .sum();
        let free_parameters = counts.n_configs * (counts.cardinality as f64 - 1.0);
        log_likelihood - 0.5 * n_rows.ln() * free_parameters
    }
}

/// Builds the score selected in `config`.
pub fn build_score<'a>(
    config: &StructureConfig,
    data: ArrayView2<'a, usize>,
    cardinalities: &'a [usize],
) -> Box<dyn StructureScore + 'a> {
    match config.scoring {
        ScoringMethod::K2 => Box::new(K2Score::new(data, cardinalities)),
        ScoringMethod::Bdeu => Box::new(BDeuScore::new(
            data,
            cardinalities,
            config.bdeu_equivalent_sample_size,
        )),
        ScoringMethod::Bic => Box::new(BicScore::new(data, cardinalities)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn dependent_data() -> Array2<usize> {
        // Column 1 copies column 0; column 2 is unrelated.
        array![
            [0, 0, 1],
            [0, 0, 0],
            [1, 1, 1],
            [1, 1, 0],
            [0, 0, 1],
            [1, 1, 0],
            [0, 0, 0],
            [1, 1, 1],
        ]
    }

    #[test]
    fn counts_follow_parent_configurations() {
        let data = dependent_data();
        let counts = state_counts(data.view(), &[2, 2, 2], 1, &[0]);
        assert_eq!(counts.by_config, vec![vec![4.0, 0.0], vec![0.0, 4.0]]);
        assert_eq!(counts.n_configs, 2.0);
    }

    #[test]
    fn k2_matches_closed_form_without_parents() {
        let data = dependent_data();
        let score = K2Score::new(data.view(), &[2, 2, 2]);
        // ln Γ(2) - ln Γ(8 + 2) + 2 ln Γ(4 + 1) = -ln 9! + 2 ln 4!
        let expected = -(362880.0f64).ln() + 2.0 * (24.0f64).ln();
        assert_abs_diff_eq!(score.local_score(1, &[]), expected, epsilon = 1e-9);
    }

    #[test]
    fn every_score_rewards_a_real_dependency() {
        let data = dependent_data();
        let cards = [2, 2, 2];
        let scores: Vec<Box<dyn StructureScore + '_>> = vec![
            Box::new(K2Score::new(data.view(), &cards)),
            Box::new(BDeuScore::new(data.view(), &cards, 10.0)),
            Box::new(BicScore::new(data.view(), &cards)),
        ];
        for score in &scores {
            assert!(score.local_score(1, &[0]) > score.local_score(1, &[]));
            assert!(score.local_score(2, &[0]) < score.local_score(2, &[]));
        }
    }

    #[test]
    fn bic_penalizes_free_parameters() {
        let data = dependent_data();
        let score = BicScore::new(data.view(), &[2, 2, 2]);
        // Column 2 is balanced: log-likelihood 8 ln(1/2), one free parameter.
        let expected = 8.0 * 0.5f64.ln() - 0.5 * 8.0f64.ln();
        assert_abs_diff_eq!(score.local_score(2, &[]), expected, epsilon = 1e-12);
    }
}
