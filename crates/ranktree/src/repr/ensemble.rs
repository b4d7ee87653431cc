//! Weighted sequence of regression trees.

use serde::{Deserialize, Serialize};

use crate::data::{DataPoint, RankList};
use crate::metric::MetricScorer;

use super::tree::RegressionTree;

// =============================================================================
// Ranker
// =============================================================================

/// Anything that scores items so lists can be ordered by score.
pub trait Ranker {
    /// Score of one item; higher ranks first.
    fn eval(&self, item: &DataPoint) -> f64;

    /// Write every item's score into its cached field and sort the list by
    /// score, highest first. Ties keep their current order.
    fn rank(&self, list: &mut RankList) {
        for item in list.items_mut() {
            let score = self.eval(item);
            item.set_cached_score(score);
        }
        list.sort_by_cached_score();
    }

    fn rank_all(&self, lists: &mut [RankList]) {
        for list in lists {
            self.rank(list);
        }
    }

    /// Mean metric over `lists` after ordering each one by this ranker.
    ///
    /// The lists themselves are left untouched.
    fn score<M: MetricScorer + ?Sized>(&self, metric: &M, lists: &[RankList]) -> f64
    where
        Self: Sized,
    {
        if lists.is_empty() {
            return 0.0;
        }
        let total: f64 = lists
            .iter()
            .map(|list| {
                let scores: Vec<f64> = list.iter().map(|item| self.eval(item)).collect();
                let labels: Vec<f32> = list.rank_order(&scores).into_iter().map(|i| list[i].label()).collect();
                metric.score_labels(&labels)
            })
            .sum();
        total / lists.len() as f64
    }
}

// =============================================================================
// Ensemble
// =============================================================================

/// Trained model: `score(item) = Σ weight_t · tree_t(item)`.
///
/// Trees and weights are parallel arrays; the ensemble owns its trees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    trees: Vec<RegressionTree>,
    weights: Vec<f64>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tree with its weight (the learning rate during training).
    pub fn add(&mut self, tree: RegressionTree, weight: f64) {
        self.trees.push(tree);
        self.weights.push(weight);
    }

    /// Remove the tree at `index`, returning it with its weight.
    pub fn remove(&mut self, index: usize) -> Option<(RegressionTree, f64)> {
        if index >= self.trees.len() {
            return None;
        }
        Some((self.trees.remove(index), self.weights.remove(index)))
    }

    /// Keep only the first `n_trees` trees.
    pub fn truncate(&mut self, n_trees: usize) {
        self.trees.truncate(n_trees);
        self.weights.truncate(n_trees);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree(&self, index: usize) -> &RegressionTree {
        &self.trees[index]
    }

    pub fn weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `(tree, weight)` pairs in boosting order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegressionTree, f64)> + '_ {
        self.trees.iter().zip(self.weights.iter().copied())
    }

    /// Total number of leaves across all trees.
    pub fn n_leaves(&self) -> usize {
        self.trees.iter().map(RegressionTree::n_leaves).sum()
    }

    /// Feature ids used by any tree, ascending.
    pub fn features(&self) -> Vec<u32> {
        let mut features: Vec<u32> = self.trees.iter().flat_map(RegressionTree::features).collect();
        features.sort_unstable();
        features.dedup();
        features
    }

    /// Score for an item whose feature values are given by `feature_value(fid)`.
    pub fn eval_with(&self, feature_value: impl Fn(u32) -> f32) -> f64 {
        self.iter().map(|(tree, w)| w * tree.eval_with(&feature_value)).sum()
    }
}

impl Ranker for Ensemble {
    fn eval(&self, item: &DataPoint) -> f64 {
        self.iter().map(|(tree, w)| w * tree.eval(item)).sum()
    }
}
