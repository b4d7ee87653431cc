//! Ranking metrics and their swap deltas.
//!
//! A [`MetricScorer`] evaluates a list whose items are already in ranked
//! order and reports, for every pair of ranks, how the metric would change
//! if the two items traded places. Training only uses the magnitude of those
//! deltas to weight pairwise gradients, so a scorer is free to be
//! approximate outside its truncation depth.
//!
//! # Available Metrics
//!
//! - [`Dcg`], [`Ndcg`]: (normalized) discounted cumulative gain at k
//! - [`Precision`]: fraction of relevant items in the top k
//! - [`AveragePrecision`]: mean precision at each relevant rank

mod dcg;
mod precision;

pub use dcg::{Dcg, Ndcg};
pub use precision::{AveragePrecision, Precision};

use ndarray::Array2;

use crate::data::RankList;

/// A ranking-quality metric over a ranked list.
///
/// Implementations must be deterministic for a fixed order of labels.
pub trait MetricScorer: Send + Sync {
    /// Display name, e.g. `NDCG@10`.
    fn name(&self) -> String;

    /// Truncation depth; `0` means the whole list.
    fn k(&self) -> usize;

    /// Metric value for labels given in ranked order.
    fn score_labels(&self, labels: &[f32]) -> f64;

    /// Symmetric matrix where entry `(i, j)` is the metric change from
    /// exchanging the items at ranks `i` and `j` (after minus before).
    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64>;

    /// Metric value of a list in its current order.
    fn score(&self, list: &RankList) -> f64 {
        self.score_labels(&list.labels())
    }

    /// Swap deltas of a list in its current order.
    fn swap_change(&self, list: &RankList) -> Array2<f64> {
        self.swap_change_labels(&list.labels())
    }

    /// Number of leading ranks the metric looks at for a list of `n` items.
    #[inline]
    fn depth(&self, n: usize) -> usize {
        match self.k() {
            0 => n,
            k => k.min(n),
        }
    }
}

impl<M: MetricScorer + ?Sized> MetricScorer for Box<M> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn k(&self) -> usize {
        (**self).k()
    }

    fn score_labels(&self, labels: &[f32]) -> f64 {
        (**self).score_labels(labels)
    }

    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64> {
        (**self).swap_change_labels(labels)
    }
}

/// Mean metric over lists, each taken in its current order. Empty input scores 0.
pub fn mean_score<M: MetricScorer + ?Sized>(metric: &M, lists: &[RankList]) -> f64 {
    if lists.is_empty() {
        return 0.0;
    }
    lists.iter().map(|rl| metric.score(rl)).sum::<f64>() / lists.len() as f64
}
