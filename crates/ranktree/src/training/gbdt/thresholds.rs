//! Candidate split thresholds per feature.
//!
//! Thresholds are derived once from the training data and never change across
//! boosting rounds. Low-cardinality features use every distinct value;
//! high-cardinality ones use evenly spaced cut points between the minimum and
//! maximum. Either way the list ends with `f32::MAX`, a catch-all bucket so
//! every sample falls into some bucket.

use serde::{Deserialize, Serialize};

use crate::training::TrainError;
use crate::utils::TaskRunner;

use super::samples::TrainingSamples;

/// How many split thresholds each feature may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdCandidates {
    /// Every distinct value of the feature.
    All,
    /// Every distinct value while there are at most `n`, otherwise `n`
    /// evenly spaced thresholds starting at the minimum.
    Max(usize),
}

impl Default for ThresholdCandidates {
    fn default() -> Self {
        Self::Max(256)
    }
}

/// Sample indices of every feature, ordered by ascending feature value.
///
/// Ties keep sample order. Sorting runs in parallel over feature ranges.
pub(crate) fn sort_by_feature(
    samples: &TrainingSamples,
    runner: &TaskRunner,
) -> Result<Vec<Vec<u32>>, TrainError> {
    let n = samples.n_samples();
    let chunks = runner.execute("sort-by-feature", samples.n_features(), |range| {
        range
            .map(|f| {
                let column = samples.feature_values(f);
                let mut idx: Vec<u32> = (0..n as u32).collect();
                idx.sort_by(|&a, &b| column[a as usize].total_cmp(&column[b as usize]));
                idx
            })
            .collect::<Vec<_>>()
    })?;
    Ok(chunks.into_iter().flatten().collect())
}

/// Candidate thresholds for one feature given its values in ascending order.
pub(crate) fn candidate_thresholds(
    sorted_values: impl IntoIterator<Item = f32>,
    candidates: ThresholdCandidates,
) -> Vec<f32> {
    let mut distinct: Vec<f32> = Vec::new();
    for v in sorted_values {
        if distinct.last().map_or(true, |&last| v > last) {
            distinct.push(v);
        }
    }

    let mut thresholds = match candidates {
        ThresholdCandidates::Max(n) if distinct.len() > n => {
            let fmin = distinct[0];
            let fmax = distinct[distinct.len() - 1];
            let step = (fmax - fmin).abs() / n as f32;
            let mut cuts = Vec::with_capacity(n + 1);
            cuts.push(fmin);
            for j in 1..n {
                cuts.push(cuts[j - 1] + step);
            }
            cuts
        }
        _ => distinct,
    };
    thresholds.push(f32::MAX);
    thresholds
}
