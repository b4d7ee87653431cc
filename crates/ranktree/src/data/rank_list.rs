//! Labeled lists: the items of one query.

use std::collections::BTreeSet;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::{DataError, DataPoint, FeatureVector};

/// The items of one query, in their current order.
///
/// Item order does not matter for training; rankers reorder lists by score
/// before handing them to a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankList {
    id: String,
    items: Vec<DataPoint>,
}

impl RankList {
    /// Build a list, checking that every item shares the first item's query id.
    pub fn new(items: Vec<DataPoint>) -> Result<Self, DataError> {
        let id = items.first().map(|dp| dp.qid().to_owned()).unwrap_or_default();
        Self::with_id(id, items)
    }

    /// Build a list with an explicit query id (allows empty lists).
    pub fn with_id(id: impl Into<String>, items: Vec<DataPoint>) -> Result<Self, DataError> {
        let id = id.into();
        if let Some(bad) = items.iter().find(|dp| dp.qid() != id) {
            return Err(DataError::QueryMismatch { expected: id, found: bad.qid().to_owned() });
        }
        Ok(Self { id, items })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn items(&self) -> &[DataPoint] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [DataPoint] {
        &mut self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.items.iter()
    }

    /// Relevance labels in list order.
    pub fn labels(&self) -> Vec<f32> {
        self.items.iter().map(DataPoint::label).collect()
    }

    /// Indices ordering the list by `scores` descending; ties keep list order.
    pub fn rank_order(&self, scores: &[f64]) -> Vec<usize> {
        debug_assert_eq!(scores.len(), self.items.len());
        rank_order(scores)
    }

    /// Reorder the items by a permutation of `0..len()`.
    pub fn reordered(mut self, order: &[usize]) -> Result<Self, DataError> {
        let len = self.items.len();
        let mut seen = vec![false; len];
        let valid = order.len() == len
            && order.iter().all(|&i| i < len && !std::mem::replace(&mut seen[i], true));
        if !valid {
            return Err(DataError::InvalidOrder { len });
        }
        let mut slots: Vec<Option<DataPoint>> = self.items.drain(..).map(Some).collect();
        self.items = order.iter().filter_map(|&i| slots[i].take()).collect();
        Ok(self)
    }

    /// Sort items by their cached scores, highest first, stable on ties.
    pub fn sort_by_cached_score(&mut self) {
        self.items
            .sort_by(|a, b| b.cached_score().total_cmp(&a.cached_score()));
    }

    /// Number of distinct feature ids stored across the list.
    pub fn feature_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(|dp| dp.features().stored_ids())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl Index<usize> for RankList {
    type Output = DataPoint;

    fn index(&self, index: usize) -> &DataPoint {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a RankList {
    type Item = &'a DataPoint;
    type IntoIter = std::slice::Iter<'a, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Stable descending argsort of `scores`.
pub(crate) fn rank_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Sorted union of the feature ids stored in `lists`.
pub fn feature_ids(lists: &[RankList]) -> Vec<u32> {
    lists
        .iter()
        .flat_map(|rl| rl.iter())
        .flat_map(|dp| dp.features().stored_ids())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
