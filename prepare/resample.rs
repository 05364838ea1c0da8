//! # Class Rebalancing (SMOTE-Tomek)
//!
//! The heart-disease table is moderately imbalanced. Before the network is learned the
//! encoded table is rebalanced in two passes:
//!
//! 1. **SMOTE** oversamples every non-majority class up to the majority count by
//!    interpolating between a minority row and one of its nearest same-class neighbours.
//!    Because every column is an integer code, interpolated coordinates are rounded back
//!    to the nearest valid code.
//! 2. **Tomek links** are then removed: pairs of rows from different classes that are
//!    each other's nearest neighbour. Both members of every link are dropped.
//!
//! All randomness flows from a single seeded `StdRng`, and neighbour searches are
//! collected in row order, so the output is identical from run to run regardless of how
//! many threads `rayon` uses.

use crate::config::ResampleConfig;
use crate::prepare::encode::EncodedTable;
use ndarray::{Array2, ArrayView1, Axis, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResampleError {
    #[error("Class {class} has only {found} sample(s); at least 2 are needed to synthesize neighbours.")]
    TooFewSamples { class: usize, found: usize },
    #[error("The neighbour count must be at least 1.")]
    ZeroNeighbours,
    #[error("Failed to assemble the resampled table: {0}")]
    Shape(String),
}

/// Rebalances `table` with SMOTE followed by Tomek-link cleaning.
pub fn smote_tomek(
    table: &EncodedTable,
    config: &ResampleConfig,
) -> Result<EncodedTable, ResampleError> {
    if config.k_neighbors == 0 {
        return Err(ResampleError::ZeroNeighbours);
    }

    let counts = table.class_counts();
    let present = counts.iter().filter(|&&c| c > 0).count();
    if present < 2 {
        log::warn!("Training data contains a single class; skipping rebalancing.");
        return Ok(table.clone());
    }

    let target = table.target_index();
    let features = table.data.slice(s![.., ..target]).mapv(|code| code as f64);
    let labels: Vec<usize> = table.data.column(target).to_vec();
    let max_codes: Vec<usize> = table.cardinalities[..target]
        .iter()
        .map(|&c| c.saturating_sub(1))
        .collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (features, labels) = oversample(
        features,
        labels,
        &counts,
        &max_codes,
        config.k_neighbors,
        &mut rng,
    )?;
    log::debug!("SMOTE produced {} rows", labels.len());

    let keep = rows_outside_tomek_links(&features, &labels);
    log::debug!(
        "Tomek cleaning removed {} rows",
        labels.len() - keep.len()
    );

    let mut data = Array2::<usize>::zeros((keep.len(), target + 1));
    for (out_row, &row) in keep.iter().enumerate() {
        for col in 0..target {
            data[[out_row, col]] = features[[row, col]] as usize;
        }
        data[[out_row, target]] = labels[row];
    }

    Ok(EncodedTable {
        columns: table.columns.clone(),
        cardinalities: table.cardinalities.clone(),
        data,
    })
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// For every row in `members`, the positions (within `members`) of its `k` nearest
/// neighbours among the other members. Ties are broken by position.
fn nearest_within(features: &Array2<f64>, members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .par_iter()
        .enumerate()
        .map(|(pos, &row)| {
            let mut candidates: Vec<(f64, usize)> = members
                .iter()
                .enumerate()
                .filter(|&(other_pos, _)| other_pos != pos)
                .map(|(other_pos, &other)| {
                    (
                        squared_distance(features.row(row), features.row(other)),
                        other_pos,
                    )
                })
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            candidates.into_iter().take(k).map(|(_, p)| p).collect()
        })
        .collect()
}

fn oversample(
    features: Array2<f64>,
    mut labels: Vec<usize>,
    counts: &[usize],
    max_codes: &[usize],
    k_neighbors: usize,
    rng: &mut StdRng,
) -> Result<(Array2<f64>, Vec<usize>), ResampleError> {
    let majority = counts.iter().copied().max().unwrap_or(0);
    let mut synthetic: Vec<f64> = Vec::new();
    let n_features = features.ncols();

    for (class, &count) in counts.iter().enumerate() {
        if count == 0 || count >= majority {
            continue;
        }
        if count < 2 {
            return Err(ResampleError::TooFewSamples { class, found: count });
        }

        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(row, _)| row)
            .collect();
        let k = k_neighbors.min(members.len() - 1);
        let neighbours = nearest_within(&features, &members, k);
        let n_new = majority - count;

        log::info!(
            "Synthesizing {} samples for class {} from {} originals (k = {})",
            n_new,
            class,
            count,
            k
        );

        for _ in 0..n_new {
            let pick = rng.gen_range(0..members.len() * k);
            let (pos, nn) = (pick / k, pick % k);
            let step: f64 = rng.gen_range(0.0..1.0);

            let base = features.row(members[pos]);
            let other = features.row(members[neighbours[pos][nn]]);
            for col in 0..n_features {
                let value = base[col] + step * (other[col] - base[col]);
                synthetic.push(value.round().clamp(0.0, max_codes[col] as f64));
            }
            labels.push(class);
        }
    }

    let n_synthetic = synthetic.len() / n_features.max(1);
    if n_synthetic == 0 {
        return Ok((features, labels));
    }
    let extra = Array2::from_shape_vec((n_synthetic, n_features), synthetic)
        .map_err(|e| ResampleError::Shape(e.to_string()))?;
    let combined = ndarray::concatenate(Axis(0), &[features.view(), extra.view()])
        .map_err(|e| ResampleError::Shape(e.to_string()))?;
    Ok((combined, labels))
}

/// Indices of rows that do not take part in any Tomek link, in ascending order.
fn rows_outside_tomek_links(features: &Array2<f64>, labels: &[usize]) -> Vec<usize> {
    let n = labels.len();
    let nearest: Vec<Option<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut best: Option<(f64, usize)> = None;
            for j in 0..n {
                if j == i {
                    continue;
                }
                let d = squared_distance(features.row(i), features.row(j));
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, j));
                }
            }
            best.map(|(_, j)| j)
        })
        .collect();

    let mut linked = vec![false; n];
    for i in 0..n {
        if let Some(j) = nearest[i] {
            if labels[i] != labels[j] && nearest[j] == Some(i) {
                linked[i] = true;
                linked[j] = true;
            }
        }
    }
    (0..n).filter(|&i| !linked[i]).collect()
}
