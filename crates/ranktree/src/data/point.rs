//! Labeled items and their feature storage.

use serde::{Deserialize, Serialize};

use super::DataError;

// =============================================================================
// Missing-feature policy
// =============================================================================

/// What reading a feature id outside a vector's range yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Absent features read as `0.0`.
    #[default]
    Zero,
    /// Absent features are an error.
    Error,
}

// =============================================================================
// FeatureVector
// =============================================================================

/// Access to a feature vector addressed by 1-based feature id.
pub trait FeatureVector {
    /// Value of `fid`, or `None` when the id lies outside the vector.
    fn get(&self, fid: u32) -> Option<f32>;

    /// Overwrite the value of an existing feature.
    fn set(&mut self, fid: u32, value: f32) -> Result<(), DataError>;

    /// Dense copy where index `fid - 1` holds feature `fid`; unknown entries are NaN.
    fn to_dense(&self) -> Vec<f32>;

    /// Replace the whole vector from a dense array in the [`to_dense`](Self::to_dense) layout.
    fn set_dense(&mut self, values: &[f32]);

    /// Largest feature id addressable in this vector.
    fn max_feature_id(&self) -> u32;

    /// Ids that carry a stored value, ascending.
    fn stored_ids(&self) -> Vec<u32>;
}

/// Fixed-size array storage, O(1) access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseFeatures {
    values: Vec<f32>,
}

impl DenseFeatures {
    /// `values[i]` is feature `i + 1`.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl FeatureVector for DenseFeatures {
    #[inline]
    fn get(&self, fid: u32) -> Option<f32> {
        if fid == 0 {
            return None;
        }
        self.values
            .get(fid as usize - 1)
            .map(|&v| if v.is_nan() { 0.0 } else { v })
    }

    fn set(&mut self, fid: u32, value: f32) -> Result<(), DataError> {
        let max_fid = self.max_feature_id();
        match fid.checked_sub(1).and_then(|i| self.values.get_mut(i as usize)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DataError::FeatureOutOfRange { fid, max_fid }),
        }
    }

    fn to_dense(&self) -> Vec<f32> {
        self.values.clone()
    }

    fn set_dense(&mut self, values: &[f32]) {
        self.values = values.to_vec();
    }

    #[inline]
    fn max_feature_id(&self) -> u32 {
        self.values.len() as u32
    }

    fn stored_ids(&self) -> Vec<u32> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }
}

/// Sorted id/value arrays, O(log F) access by binary search.
///
/// Ids within `1..=max_feature_id()` that are not stored read as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseFeatures {
    ids: Vec<u32>,
    values: Vec<f32>,
}

impl SparseFeatures {
    pub fn new(ids: Vec<u32>, values: Vec<f32>) -> Result<Self, DataError> {
        if ids.len() != values.len() {
            return Err(DataError::SparseLengthMismatch { ids: ids.len(), values: values.len() });
        }
        let sorted = ids.first().map_or(true, |&first| first >= 1)
            && ids.windows(2).all(|w| w[0] < w[1]);
        if !sorted {
            return Err(DataError::UnsortedSparseIds(ids));
        }
        Ok(Self { ids, values })
    }

    #[inline]
    fn locate(&self, fid: u32) -> Option<usize> {
        self.ids.binary_search(&fid).ok()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.ids.len()
    }
}

impl FeatureVector for SparseFeatures {
    #[inline]
    fn get(&self, fid: u32) -> Option<f32> {
        if fid == 0 || fid > self.max_feature_id() {
            return None;
        }
        Some(self.locate(fid).map_or(0.0, |pos| self.values[pos]))
    }

    fn set(&mut self, fid: u32, value: f32) -> Result<(), DataError> {
        let max_fid = self.max_feature_id();
        if fid == 0 || fid > max_fid {
            return Err(DataError::FeatureOutOfRange { fid, max_fid });
        }
        let pos = self.locate(fid).ok_or(DataError::UnknownSparseFeature(fid))?;
        self.values[pos] = value;
        Ok(())
    }

    fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![f32::NAN; self.max_feature_id() as usize];
        for (&fid, &v) in self.ids.iter().zip(&self.values) {
            dense[fid as usize - 1] = v;
        }
        dense
    }

    fn set_dense(&mut self, values: &[f32]) {
        self.ids.clear();
        self.values.clear();
        for (i, &v) in values.iter().enumerate() {
            if !v.is_nan() {
                self.ids.push(i as u32 + 1);
                self.values.push(v);
            }
        }
    }

    #[inline]
    fn max_feature_id(&self) -> u32 {
        self.ids.last().copied().unwrap_or(0)
    }

    fn stored_ids(&self) -> Vec<u32> {
        self.ids.clone()
    }
}

/// Dense or sparse feature storage, chosen once at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Features {
    Dense(DenseFeatures),
    Sparse(SparseFeatures),
}

impl FeatureVector for Features {
    #[inline]
    fn get(&self, fid: u32) -> Option<f32> {
        match self {
            Features::Dense(v) => v.get(fid),
            Features::Sparse(v) => v.get(fid),
        }
    }

    fn set(&mut self, fid: u32, value: f32) -> Result<(), DataError> {
        match self {
            Features::Dense(v) => v.set(fid, value),
            Features::Sparse(v) => v.set(fid, value),
        }
    }

    fn to_dense(&self) -> Vec<f32> {
        match self {
            Features::Dense(v) => v.to_dense(),
            Features::Sparse(v) => v.to_dense(),
        }
    }

    fn set_dense(&mut self, values: &[f32]) {
        match self {
            Features::Dense(v) => v.set_dense(values),
            Features::Sparse(v) => v.set_dense(values),
        }
    }

    fn max_feature_id(&self) -> u32 {
        match self {
            Features::Dense(v) => v.max_feature_id(),
            Features::Sparse(v) => v.max_feature_id(),
        }
    }

    fn stored_ids(&self) -> Vec<u32> {
        match self {
            Features::Dense(v) => v.stored_ids(),
            Features::Sparse(v) => v.stored_ids(),
        }
    }
}

// =============================================================================
// DataPoint
// =============================================================================

/// A labeled item of one query.
///
/// Everything except [`cached_score`](Self::cached_score) is fixed after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    label: f32,
    qid: String,
    description: Option<String>,
    features: Features,
    missing: MissingPolicy,
    #[serde(skip)]
    cached_score: f64,
}

impl DataPoint {
    pub fn new(label: f32, qid: impl Into<String>, features: Features) -> Self {
        Self {
            label,
            qid: qid.into(),
            description: None,
            features,
            missing: MissingPolicy::default(),
            cached_score: 0.0,
        }
    }

    /// Item with dense features; `values[i]` is feature `i + 1`.
    pub fn dense(label: f32, qid: impl Into<String>, values: Vec<f32>) -> Self {
        Self::new(label, qid, Features::Dense(DenseFeatures::new(values)))
    }

    /// Item with sparse features given as parallel id/value arrays.
    pub fn sparse(
        label: f32,
        qid: impl Into<String>,
        ids: Vec<u32>,
        values: Vec<f32>,
    ) -> Result<Self, DataError> {
        Ok(Self::new(label, qid, Features::Sparse(SparseFeatures::new(ids, values)?)))
    }

    pub fn with_missing_policy(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn label(&self) -> f32 {
        self.label
    }

    #[inline]
    pub fn qid(&self) -> &str {
        &self.qid
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut Features {
        &mut self.features
    }

    #[inline]
    pub fn missing_policy(&self) -> MissingPolicy {
        self.missing
    }

    /// Feature value honoring the item's [`MissingPolicy`].
    #[inline]
    pub fn value(&self, fid: u32) -> Result<f32, DataError> {
        match (self.features.get(fid), self.missing) {
            (Some(v), _) => Ok(v),
            (None, MissingPolicy::Zero) => Ok(0.0),
            (None, MissingPolicy::Error) => Err(DataError::MissingFeature {
                fid,
                max_fid: self.features.max_feature_id(),
            }),
        }
    }

    /// Feature value with absent ids read as zero, for scoring paths that
    /// already validated the feature set.
    #[inline]
    pub fn value_or_zero(&self, fid: u32) -> f32 {
        self.features.get(fid).unwrap_or(0.0)
    }

    /// Scratch score written by rankers.
    #[inline]
    pub fn cached_score(&self) -> f64 {
        self.cached_score
    }

    #[inline]
    pub fn set_cached_score(&mut self, score: f64) {
        self.cached_score = score;
    }
}
