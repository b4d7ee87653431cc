//! Precision-based metrics with binary relevance (`label > 0`).

use ndarray::Array2;

use super::MetricScorer;

#[inline]
fn relevant(label: f32) -> i32 {
    i32::from(label > 0.0)
}

/// Precision at k.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    k: usize,
}

impl Precision {
    /// `k = 0` evaluates the whole list.
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(10)
    }
}

impl MetricScorer for Precision {
    fn name(&self) -> String {
        format!("P@{}", self.k)
    }

    fn k(&self) -> usize {
        self.k
    }

    fn score_labels(&self, labels: &[f32]) -> f64 {
        let depth = self.depth(labels.len());
        if depth == 0 {
            return 0.0;
        }
        let hits: i32 = labels[..depth].iter().map(|&l| relevant(l)).sum();
        hits as f64 / depth as f64
    }

    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64> {
        let n = labels.len();
        let depth = self.depth(n);
        let mut changes = Array2::zeros((n, n));
        // Only swaps across the cutoff change the count.
        for i in 0..depth {
            for j in depth..n {
                let c = relevant(labels[j]) - relevant(labels[i]);
                let delta = c as f64 / depth as f64;
                changes[[i, j]] = delta;
                changes[[j, i]] = delta;
            }
        }
        changes
    }
}

/// Average precision over the relevant items of the whole list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AveragePrecision;

impl MetricScorer for AveragePrecision {
    fn name(&self) -> String {
        "MAP".to_string()
    }

    fn k(&self) -> usize {
        0
    }

    fn score_labels(&self, labels: &[f32]) -> f64 {
        let mut hits = 0usize;
        let mut ap = 0.0;
        for (rank, &label) in labels.iter().enumerate() {
            if relevant(label) == 1 {
                hits += 1;
                ap += hits as f64 / (rank + 1) as f64;
            }
        }
        if hits == 0 {
            0.0
        } else {
            ap / hits as f64
        }
    }

    fn swap_change_labels(&self, labels: &[f32]) -> Array2<f64> {
        let n = labels.len();
        let rel: Vec<i32> = labels.iter().map(|&l| relevant(l)).collect();
        // Relevant items at or above each rank.
        let rel_count: Vec<i32> = rel
            .iter()
            .scan(0, |acc, &r| {
                *acc += r;
                Some(*acc)
            })
            .collect();
        let total = rel_count.last().copied().unwrap_or(0);

        let mut changes = Array2::zeros((n, n));
        if total == 0 {
            return changes;
        }
        for i in 0..n {
            for j in i + 1..n {
                if rel[i] == rel[j] {
                    continue;
                }
                let diff = rel[j] - rel[i];
                let mut change =
                    ((rel_count[i] + diff) * rel[j] - rel_count[i] * rel[i]) as f64 / (i + 1) as f64;
                for (k, &r) in rel.iter().enumerate().take(j).skip(i + 1) {
                    if r > 0 {
                        change += diff as f64 / (k + 1) as f64;
                    }
                }
                change -= (rel_count[j] * diff) as f64 / (j + 1) as f64;
                let delta = change / total as f64;
                changes[[i, j]] = delta;
                changes[[j, i]] = delta;
            }
        }
        changes
    }
}
