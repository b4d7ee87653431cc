//! Per-feature split impact accumulated during training.

use serde::{Deserialize, Serialize};

/// Total error reduction and split count attributed to each feature.
///
/// Every time a feature is chosen for a split, the reduction in squared
/// error of the node's pseudo-labels is added to that feature's total. The
/// totals are diagnostic only; they never influence training.
///
/// Entries are kept sorted by descending impact, ties by ascending feature id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    entries: Vec<ImportanceEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEntry {
    pub feature: u32,
    /// Accumulated error reduction.
    pub impact: f64,
    /// Number of splits on this feature.
    pub splits: u32,
}

impl FeatureImportance {
    /// Build from parallel arrays indexed by feature position.
    pub fn new(features: &[u32], impacts: &[f64], splits: &[u32]) -> Self {
        let mut entries: Vec<ImportanceEntry> = features
            .iter()
            .zip(impacts)
            .zip(splits)
            .map(|((&feature, &impact), &splits)| ImportanceEntry { feature, impact, splits })
            .collect();
        entries.sort_by(|a, b| b.impact.total_cmp(&a.impact).then(a.feature.cmp(&b.feature)));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImportanceEntry] {
        &self.entries
    }

    /// `(feature, impact)` pairs, highest impact first.
    pub fn values(&self) -> Vec<(u32, f64)> {
        self.entries.iter().map(|e| (e.feature, e.impact)).collect()
    }

    /// Impact of one feature, `None` if the feature was never a candidate.
    pub fn get(&self, feature: u32) -> Option<f64> {
        self.entries.iter().find(|e| e.feature == feature).map(|e| e.impact)
    }

    /// Impacts scaled to sum to one. All zeros if nothing was split.
    pub fn normalized(&self) -> Vec<(u32, f64)> {
        let total: f64 = self.entries.iter().map(|e| e.impact).sum();
        self.entries
            .iter()
            .map(|e| (e.feature, if total > 0.0 { e.impact / total } else { 0.0 }))
            .collect()
    }

    /// The `k` most impactful features.
    pub fn top_k(&self, k: usize) -> Vec<(u32, f64)> {
        self.entries.iter().take(k).map(|e| (e.feature, e.impact)).collect()
    }

    /// Features that were split on at least once, ascending.
    pub fn used_features(&self) -> Vec<u32> {
        let mut used: Vec<u32> = self.entries.iter().filter(|e| e.splits > 0).map(|e| e.feature).collect();
        used.sort_unstable();
        used
    }
}
