//! Pseudo-label objectives for boosted ranking.
//!
//! An objective turns the current model scores into per-sample pseudo-labels
//! (and second-order weights) that the next tree is fit against, and decides
//! the output of each leaf from the pseudo-labels of its samples.
//!
//! # Available Objectives
//!
//! - [`LambdaObjective`]: pairwise logistic gradients weighted by metric swap
//!   deltas (LambdaMART)
//! - [`PointwiseObjective`]: least-squares residuals (MART)

use std::ops::Range;

use crate::data::rank_order;
use crate::metric::MetricScorer;
use crate::training::TrainError;
use crate::utils::{split_at_bounds_mut, TaskRunner};

use super::samples::TrainingSamples;

// =============================================================================
// Objective Trait
// =============================================================================

/// Source of pseudo-labels and leaf outputs for one boosting variant.
pub trait RankObjective: Send + Sync {
    /// Short learner name used in logs.
    fn name(&self) -> &'static str;

    /// Fill `pseudo` and `weights` (both `n_samples` long) from the current
    /// cumulative `scores`.
    fn compute_pseudo_labels<M: MetricScorer + ?Sized>(
        &self,
        metric: &M,
        samples: &TrainingSamples,
        scores: &[f64],
        pseudo: &mut [f64],
        weights: &mut [f64],
        runner: &TaskRunner,
    ) -> Result<(), TrainError>;

    /// Output of a leaf holding `leaf_samples`.
    fn leaf_output(&self, leaf_samples: &[u32], pseudo: &[f64], weights: &[f64]) -> f64;
}

fn check_shapes(samples: &TrainingSamples, scores: &[f64], pseudo: &[f64], weights: &[f64]) -> Result<(), TrainError> {
    let n = samples.n_samples();
    TrainError::check_len("model scores", n, scores.len())?;
    TrainError::check_len("pseudo labels", n, pseudo.len())?;
    TrainError::check_len("second-order weights", n, weights.len())
}

// =============================================================================
// LambdaMART
// =============================================================================

/// Pairwise lambda gradients (LambdaMART).
///
/// Per list, items are re-ranked by their current score; for every pair where
/// the item at rank `j` has a strictly higher label than the item at rank
/// `k`, with `|Δmetric| = |swap(j, k)| > 0`:
///
/// ```text
/// rho = 1 / (1 + exp(s_j - s_k))
/// lambda_j += rho * |Δmetric|      lambda_k -= rho * |Δmetric|
/// w_j += rho (1 - rho) |Δmetric|   w_k += rho (1 - rho) |Δmetric|
/// ```
///
/// Pairs with both ranks beyond the metric's truncation depth are skipped.
/// Leaves output the Newton step `Σ lambda / Σ w`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaObjective;

impl LambdaObjective {
    fn compute_group<M: MetricScorer + ?Sized>(
        metric: &M,
        labels: &[f32],
        scores: &[f64],
        lambdas: &mut [f64],
        weights: &mut [f64],
    ) {
        lambdas.fill(0.0);
        weights.fill(0.0);

        let n = labels.len();
        if n < 2 {
            return;
        }
        let order = rank_order(scores);
        let ranked_labels: Vec<f32> = order.iter().map(|&i| labels[i]).collect();
        let swap = metric.swap_change_labels(&ranked_labels);
        let depth = metric.depth(n);

        for j in 0..n {
            let mj = order[j];
            for k in 0..n {
                if j >= depth && k >= depth {
                    break;
                }
                if ranked_labels[j] <= ranked_labels[k] {
                    continue;
                }
                let delta = swap[[j, k]].abs();
                if delta <= 0.0 {
                    continue;
                }
                let mk = order[k];
                let rho = 1.0 / (1.0 + (scores[mj] - scores[mk]).exp());
                let lambda = rho * delta;
                lambdas[mj] += lambda;
                lambdas[mk] -= lambda;
                let w = rho * (1.0 - rho) * delta;
                weights[mj] += w;
                weights[mk] += w;
            }
        }
    }
}

impl RankObjective for LambdaObjective {
    fn name(&self) -> &'static str {
        "LambdaMART"
    }

    /// Lists are partitioned across workers; each worker owns the slices of
    /// `pseudo` and `weights` covering its lists.
    fn compute_pseudo_labels<M: MetricScorer + ?Sized>(
        &self,
        metric: &M,
        samples: &TrainingSamples,
        scores: &[f64],
        pseudo: &mut [f64],
        weights: &mut [f64],
        runner: &TaskRunner,
    ) -> Result<(), TrainError> {
        check_shapes(samples, scores, pseudo, weights)?;

        let offsets = samples.group_offsets();
        let group_bounds = runner.partition(samples.n_groups());
        let sample_bounds: Vec<usize> = group_bounds.iter().map(|&g| offsets[g]).collect();
        let groups: Vec<Range<usize>> = group_bounds.windows(2).map(|w| w[0]..w[1]).collect();

        let jobs: Vec<_> = groups
            .into_iter()
            .zip(split_at_bounds_mut(pseudo, &sample_bounds))
            .zip(split_at_bounds_mut(weights, &sample_bounds))
            .map(|((g, p), w)| (g, p, w))
            .collect();

        let labels = samples.labels();
        runner.run_all("lambda-gradients", jobs, |(groups, pseudo, weights)| {
            let base = offsets[groups.start];
            for g in groups {
                let range = samples.group(g);
                let local = (range.start - base)..(range.end - base);
                Self::compute_group(
                    metric,
                    &labels[range.clone()],
                    &scores[range],
                    &mut pseudo[local.clone()],
                    &mut weights[local],
                );
            }
        })?;
        Ok(())
    }

    fn leaf_output(&self, leaf_samples: &[u32], pseudo: &[f64], weights: &[f64]) -> f64 {
        let (mut s1, mut s2) = (0.0, 0.0);
        for &k in leaf_samples {
            s1 += pseudo[k as usize];
            s2 += weights[k as usize];
        }
        if s2 == 0.0 {
            0.0
        } else {
            s1 / s2
        }
    }
}

// =============================================================================
// MART
// =============================================================================

/// Least-squares residuals (MART).
///
/// `pseudo_i = label_i - score_i`, unit weights, and each leaf outputs the
/// mean residual of its samples. The metric is only used for reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointwiseObjective;

impl RankObjective for PointwiseObjective {
    fn name(&self) -> &'static str {
        "MART"
    }

    fn compute_pseudo_labels<M: MetricScorer + ?Sized>(
        &self,
        _metric: &M,
        samples: &TrainingSamples,
        scores: &[f64],
        pseudo: &mut [f64],
        weights: &mut [f64],
        _runner: &TaskRunner,
    ) -> Result<(), TrainError> {
        check_shapes(samples, scores, pseudo, weights)?;
        for ((p, &label), &score) in pseudo.iter_mut().zip(samples.labels()).zip(scores) {
            *p = label as f64 - score;
        }
        weights.fill(1.0);
        Ok(())
    }

    fn leaf_output(&self, leaf_samples: &[u32], pseudo: &[f64], _weights: &[f64]) -> f64 {
        if leaf_samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = leaf_samples.iter().map(|&k| pseudo[k as usize]).sum();
        sum / leaf_samples.len() as f64
    }
}
