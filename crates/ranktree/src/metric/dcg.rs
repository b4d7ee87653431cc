//! Discounted cumulative gain.

use ndarray::Array2;

use super::MetricScorer;

#[inline]
fn gain(label: f32) -> f64 {
    2f64.powf(label as f64) - 1.0
}

#[inline]
fn discount(rank: usize) -> f64 {
    1.0 / (rank as f64 + 2.0).log2()
}

fn dcg(labels: &[f32], depth: usize) -> f64 {
    labels[..depth]
        .iter()
        .enumerate()
        .map(|(rank, &label)| gain(label) * discount(rank))
        .sum()
}

/// DCG of the best possible ordering of `labels`, truncated at `depth`.
fn ideal_dcg(labels: &[f32], depth: usize) -> f64 {
    let mut sorted = labels.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    dcg(&sorted, depth)
}

/// Pairwise DCG deltas for ranks where the smaller rank lies within `depth`.
fn dcg_swap_change(labels: &[f32], depth: usize, norm: f64) -> Array2<f64> {
    let n = labels.len();
    let mut changes = Array2::zeros((n, n));
    if norm <= 0.0 {
        return changes;
    }
    for i in 0..depth {
        for j in i + 1..n {
            let delta = (discount(i) - discount(j)) * (gain(labels[j]) - gain(labels[i])) / norm;
            changes[[i, j]] = delta;
            changes[[j, i]] = delta;
        }
    }
    changes
}

/// DCG@k with gain `2^label - 1` and discount `1 / log2(rank + 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dcg {
    k: usize,
}

impl Dcg {
    /// `k = 0` evaluates the whole list.
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for Dcg {
    fn default() -> Self {
        Self::new(10)
    }
}

impl MetricScorer for Dcg {
    fn name(&self) -> String {
        format!("DCG@{}", self.k)
    }

    fn k(&self) -> usize {
        self.k
    }

    fn score_labels(&self, labels: &[f32]) -> f64 {
        dcg(labels, self.depth(labels.len()))
    }

    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64> {
        dcg_swap_change(labels, self.depth(labels.len()), 1.0)
    }
}

/// DCG@k divided by the DCG@k of the ideal ordering of the whole list.
///
/// Lists without any positive label score 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ndcg {
    k: usize,
}

impl Ndcg {
    /// `k = 0` evaluates the whole list.
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for Ndcg {
    fn default() -> Self {
        Self::new(10)
    }
}

impl MetricScorer for Ndcg {
    fn name(&self) -> String {
        format!("NDCG@{}", self.k)
    }

    fn k(&self) -> usize {
        self.k
    }

    fn score_labels(&self, labels: &[f32]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let depth = self.depth(labels.len());
        let ideal = ideal_dcg(labels, depth);
        if ideal <= 0.0 {
            return 0.0;
        }
        dcg(labels, depth) / ideal
    }

    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64> {
        let depth = self.depth(labels.len());
        dcg_swap_change(labels, depth, ideal_dcg(labels, depth))
    }
}
