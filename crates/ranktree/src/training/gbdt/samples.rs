//! Flattened view of the training lists.
//!
//! Boosting works on one flat sample axis: the items of every list laid end
//! to end, with group offsets marking where each list starts. Feature values
//! are copied once into a feature-major matrix so that per-feature scans are
//! contiguous.

use std::ops::Range;

use ndarray::{Array2, ArrayView1};

use crate::data::{DataPoint, RankList};
use crate::training::TrainError;

/// Labels, group boundaries and feature values of the training set.
#[derive(Debug, Clone)]
pub struct TrainingSamples {
    /// Feature ids, ascending. Position `f` in every per-feature array refers to `features[f]`.
    features: Vec<u32>,
    /// Shape `[n_features, n_samples]`.
    values: Array2<f32>,
    labels: Vec<f32>,
    /// `n_groups + 1` offsets into the sample axis.
    group_offsets: Vec<usize>,
}

impl TrainingSamples {
    /// Flatten `lists` and read `features` from every item.
    ///
    /// Reads honor each item's missing-feature policy, so a list lacking a
    /// feature under the strict policy fails here, before any training work.
    pub fn from_lists(lists: &[RankList], features: &[u32]) -> Result<Self, TrainError> {
        let (points, group_offsets) = flatten(lists);
        if points.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }

        let n_samples = points.len();
        let mut values = Array2::<f32>::zeros((features.len(), n_samples));
        for (k, dp) in points.iter().enumerate() {
            for (f, &fid) in features.iter().enumerate() {
                values[[f, k]] = dp.value(fid)?;
            }
        }

        Ok(Self {
            features: features.to_vec(),
            values,
            labels: points.iter().map(|dp| dp.label()).collect(),
            group_offsets,
        })
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn n_groups(&self) -> usize {
        self.group_offsets.len() - 1
    }

    #[inline]
    pub fn features(&self) -> &[u32] {
        &self.features
    }

    #[inline]
    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    #[inline]
    pub fn group_offsets(&self) -> &[usize] {
        &self.group_offsets
    }

    /// Sample range of group `g`.
    #[inline]
    pub fn group(&self, g: usize) -> Range<usize> {
        self.group_offsets[g]..self.group_offsets[g + 1]
    }

    /// All values of the feature at position `f`, in sample order.
    #[inline]
    pub fn feature_values(&self, f: usize) -> ArrayView1<'_, f32> {
        self.values.row(f)
    }

    #[inline]
    pub fn value(&self, f: usize, sample: usize) -> f32 {
        self.values[[f, sample]]
    }
}

/// Items of all lists end to end, plus the `n_lists + 1` start offsets.
pub(crate) fn flatten(lists: &[RankList]) -> (Vec<&DataPoint>, Vec<usize>) {
    let mut offsets = Vec::with_capacity(lists.len() + 1);
    offsets.push(0);
    let mut points = Vec::new();
    for rl in lists {
        points.extend(rl.iter());
        offsets.push(points.len());
    }
    (points, offsets)
}
