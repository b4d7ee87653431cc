//! Best-split search over a node histogram.
//!
//! A candidate split sends the samples in buckets `<= t` of feature `f` left
//! and the rest right. Its quality is
//!
//! ```text
//! S = sum_left² / count_left + sum_right² / count_right
//! ```
//!
//! Maximizing `S` minimizes the squared error of approximating the node's
//! pseudo-labels by one mean per side.
//!
//! # Tie-break
//!
//! Features are scanned in ascending position and thresholds in ascending
//! order. A candidate from a later feature replaces the best only with a
//! strictly larger `S`; within the feature that holds the best, an equal `S`
//! at a larger threshold wins. Per-worker results are merged in partition
//! order with the same strict rule, so the outcome does not depend on the
//! pool size.

use crate::training::TrainError;
use crate::utils::TaskRunner;

use super::histogram::FeatureHistogram;

/// The winning (feature, threshold) of a split search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Feature position in the histogram layout.
    pub feature: usize,
    /// Threshold bucket; samples in buckets `<= threshold` go left.
    pub threshold: usize,
    /// Split quality `S`.
    pub score: f64,
    pub count_left: u32,
    pub sum_left: f64,
}

impl SplitCandidate {
    #[inline]
    fn beats(&self, best: Option<&SplitCandidate>) -> bool {
        match best {
            None => true,
            Some(best) => {
                self.score > best.score || (self.score == best.score && self.feature == best.feature)
            }
        }
    }
}

/// Best split over the feature positions in `features` (ascending).
///
/// Returns `None` when no threshold leaves at least `min_leaf_support`
/// samples on both sides.
pub fn find_best_split(
    hist: &FeatureHistogram,
    features: &[usize],
    min_leaf_support: usize,
    runner: &TaskRunner,
) -> Result<Option<SplitCandidate>, TrainError> {
    let per_chunk = runner.execute("split-search", features.len(), |range| {
        best_in(hist, &features[range], min_leaf_support)
    })?;

    let mut best: Option<SplitCandidate> = None;
    for candidate in per_chunk.into_iter().flatten() {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    Ok(best)
}

fn best_in(hist: &FeatureHistogram, features: &[usize], min_leaf_support: usize) -> Option<SplitCandidate> {
    let total = hist.n_samples() as u32;
    let total_sum = hist.sum_response();
    let min = min_leaf_support as u32;

    let mut best: Option<SplitCandidate> = None;
    for &f in features {
        let sums = hist.sum(f);
        let counts = hist.count(f);
        for (t, (&sum_left, &count_left)) in sums.iter().zip(counts).enumerate() {
            let count_right = total - count_left;
            if count_left < min || count_right < min || count_left == 0 || count_right == 0 {
                continue;
            }
            let sum_right = total_sum - sum_left;
            let score = sum_left * sum_left / count_left as f64 + sum_right * sum_right / count_right as f64;
            let candidate = SplitCandidate { feature: f, threshold: t, score, count_left, sum_left };
            if candidate.beats(best.as_ref()) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Split a node's samples by the candidate using the shared bucket map.
///
/// Sample order is preserved on both sides.
pub fn partition_samples(
    hist: &FeatureHistogram,
    split: &SplitCandidate,
    samples: &[u32],
) -> (Vec<u32>, Vec<u32>) {
    let layout = hist.layout();
    let n_left = split.count_left as usize;
    let mut left = Vec::with_capacity(n_left);
    let mut right = Vec::with_capacity(samples.len().saturating_sub(n_left));
    for &k in samples {
        if layout.bucket(split.feature, k as usize) <= split.threshold {
            left.push(k);
        } else {
            right.push(k);
        }
    }
    (left, right)
}
