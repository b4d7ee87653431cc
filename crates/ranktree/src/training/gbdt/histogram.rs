//! Cumulative per-feature histograms of pseudo-labels.
//!
//! For every feature `f` and threshold bucket `t`, a [`FeatureHistogram`]
//! holds the sum of pseudo-labels and the sample count over the samples of
//! one tree node whose value for `f` is at most `thresholds[f][t]`. The split
//! search reads both sides of any candidate split straight from these prefix
//! sums.
//!
//! # Bucket map
//!
//! Thresholds are fixed for the whole run, so each sample's bucket per
//! feature is computed once during [`construct`](FeatureHistogram::construct)
//! and shared by every histogram of every tree. Refreshing the root after the
//! pseudo-labels change is then a linear pass without re-sorting.
//!
//! # Subtraction
//!
//! A child histogram is either scanned from its sample subset or derived as
//! parent minus sibling. Only the smaller child is scanned. Subtraction can
//! reuse the parent's storage, which consumes the parent by value: a parent
//! that has been turned into a child can no longer be read.
//!
//! # Numeric precision
//!
//! Sums are `f64` regardless of the `f32` feature storage, since children are
//! derived by differences of large sums across many rounds.

use std::sync::Arc;

use crate::training::TrainError;
use crate::utils::{split_at_bounds_mut, TaskRunner};

use super::samples::TrainingSamples;
use super::thresholds::{candidate_thresholds, sort_by_feature, ThresholdCandidates};

// =============================================================================
// Layout
// =============================================================================

/// Threshold table and sample-to-bucket map shared by all histograms of a run.
#[derive(Debug)]
pub struct HistogramLayout {
    features: Vec<u32>,
    thresholds: Vec<Vec<f32>>,
    /// `buckets[f][k]`: threshold bucket of sample `k` for feature position `f`.
    buckets: Vec<Vec<u32>>,
    n_samples: usize,
}

impl HistogramLayout {
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Feature id at position `f`.
    #[inline]
    pub fn feature_id(&self, f: usize) -> u32 {
        self.features[f]
    }

    #[inline]
    pub fn thresholds(&self, f: usize) -> &[f32] {
        &self.thresholds[f]
    }

    #[inline]
    pub fn bucket(&self, f: usize, sample: usize) -> usize {
        self.buckets[f][sample] as usize
    }
}

// =============================================================================
// FeatureHistogram
// =============================================================================

/// Prefix sums of pseudo-labels and counts over the samples of one node.
#[derive(Debug, Clone)]
pub struct FeatureHistogram {
    layout: Arc<HistogramLayout>,
    /// `sum[f][t]`: pseudo-label sum over samples in buckets `<= t`.
    sum: Vec<Vec<f64>>,
    /// `count[f][t]`: samples in buckets `<= t`.
    count: Vec<Vec<u32>>,
    n_samples: usize,
    sum_response: f64,
    sq_sum_response: f64,
}

/// Per-feature output of the construction pass.
struct FeatureScan {
    thresholds: Vec<f32>,
    buckets: Vec<u32>,
    sum: Vec<f64>,
    count: Vec<u32>,
}

impl FeatureHistogram {
    /// Build the root histogram over all samples.
    ///
    /// Derives the threshold table, then walks each feature's samples in
    /// ascending value order once, emitting cumulative sums at every
    /// threshold boundary and recording each sample's bucket. Runs in
    /// parallel over feature ranges.
    pub fn construct(
        samples: &TrainingSamples,
        labels: &[f64],
        candidates: ThresholdCandidates,
        runner: &TaskRunner,
    ) -> Result<Self, TrainError> {
        let n = samples.n_samples();
        TrainError::check_len("pseudo labels", n, labels.len())?;

        let sorted = sort_by_feature(samples, runner)?;
        let chunks = runner.execute("histogram-construct", samples.n_features(), |range| {
            range
                .map(|f| scan_feature(samples, f, &sorted[f], labels, candidates))
                .collect::<Vec<_>>()
        })?;

        let n_features = samples.n_features();
        let mut thresholds = Vec::with_capacity(n_features);
        let mut buckets = Vec::with_capacity(n_features);
        let mut sum = Vec::with_capacity(n_features);
        let mut count = Vec::with_capacity(n_features);
        for scan in chunks.into_iter().flatten() {
            thresholds.push(scan.thresholds);
            buckets.push(scan.buckets);
            sum.push(scan.sum);
            count.push(scan.count);
        }

        let (sum_response, sq_sum_response) = response_sums(labels.iter().copied());
        let layout = HistogramLayout {
            features: samples.features().to_vec(),
            thresholds,
            buckets,
            n_samples: n,
        };
        Ok(Self {
            layout: Arc::new(layout),
            sum,
            count,
            n_samples: n,
            sum_response,
            sq_sum_response,
        })
    }

    /// Re-accumulate sums for new pseudo-labels using the bucket map.
    ///
    /// Only valid on a histogram that owns every sample (the root). Counts
    /// do not change.
    pub fn update(&mut self, labels: &[f64], runner: &TaskRunner) -> Result<(), TrainError> {
        TrainError::check_len("histogram samples", self.layout.n_samples, self.n_samples)?;
        TrainError::check_len("pseudo labels", self.n_samples, labels.len())?;

        let bounds = runner.partition(self.layout.n_features());
        let jobs: Vec<_> = bounds
            .windows(2)
            .map(|w| w[0])
            .zip(split_at_bounds_mut(&mut self.sum, &bounds))
            .collect();
        let layout = &self.layout;
        runner.run_all("histogram-update", jobs, |(start, sums)| {
            for (i, sum) in sums.iter_mut().enumerate() {
                let buckets = &layout.buckets[start + i];
                sum.fill(0.0);
                for (k, &label) in labels.iter().enumerate() {
                    sum[buckets[k] as usize] += label;
                }
                prefix_sum(sum);
            }
        })?;

        (self.sum_response, self.sq_sum_response) = response_sums(labels.iter().copied());
        Ok(())
    }

    /// Histogram of a child node scanned from its sample subset.
    pub fn from_subset(
        parent: &FeatureHistogram,
        subset: &[u32],
        labels: &[f64],
        runner: &TaskRunner,
    ) -> Result<Self, TrainError> {
        TrainError::check_len("pseudo labels", parent.layout.n_samples, labels.len())?;

        let layout = &parent.layout;
        let chunks = runner.execute("histogram-subset", layout.n_features(), |range| {
            range
                .map(|f| {
                    let n_thresholds = layout.thresholds[f].len();
                    let buckets = &layout.buckets[f];
                    let mut sum = vec![0.0; n_thresholds];
                    let mut count = vec![0u32; n_thresholds];
                    for &k in subset {
                        let t = buckets[k as usize] as usize;
                        sum[t] += labels[k as usize];
                        count[t] += 1;
                    }
                    prefix_sum(&mut sum);
                    prefix_count(&mut count);
                    (sum, count)
                })
                .collect::<Vec<_>>()
        })?;
        let (sum, count): (Vec<_>, Vec<_>) = chunks.into_iter().flatten().unzip();

        let (sum_response, sq_sum_response) =
            response_sums(subset.iter().map(|&k| labels[k as usize]));
        Ok(Self {
            layout: Arc::clone(layout),
            sum,
            count,
            n_samples: subset.len(),
            sum_response,
            sq_sum_response,
        })
    }

    /// `parent - sibling`, allocating new storage. The parent stays readable.
    pub fn subtract(
        parent: &FeatureHistogram,
        sibling: &FeatureHistogram,
        runner: &TaskRunner,
    ) -> Result<Self, TrainError> {
        Self::subtract_in_place(parent.clone(), sibling, runner)
    }

    /// `parent - sibling`, overwriting the parent's storage.
    pub fn subtract_in_place(
        mut parent: FeatureHistogram,
        sibling: &FeatureHistogram,
        runner: &TaskRunner,
    ) -> Result<Self, TrainError> {
        parent.check_compatible(sibling)?;
        if sibling.n_samples > parent.n_samples {
            return Err(TrainError::ShapeMismatch {
                what: "sibling histogram samples",
                expected: parent.n_samples,
                actual: sibling.n_samples,
            });
        }

        let bounds = runner.partition(parent.layout.n_features());
        let jobs: Vec<_> = bounds
            .windows(2)
            .map(|w| w[0])
            .zip(split_at_bounds_mut(&mut parent.sum, &bounds))
            .zip(split_at_bounds_mut(&mut parent.count, &bounds))
            .collect();
        runner.run_all("histogram-subtract", jobs, |((start, sums), counts)| {
            for (i, (sum, count)) in sums.iter_mut().zip(counts.iter_mut()).enumerate() {
                let f = start + i;
                for (s, o) in sum.iter_mut().zip(&sibling.sum[f]) {
                    *s -= o;
                }
                for (c, o) in count.iter_mut().zip(&sibling.count[f]) {
                    *c -= o;
                }
            }
        })?;

        parent.n_samples -= sibling.n_samples;
        parent.sum_response -= sibling.sum_response;
        parent.sq_sum_response -= sibling.sq_sum_response;
        Ok(parent)
    }

    fn check_compatible(&self, other: &FeatureHistogram) -> Result<(), TrainError> {
        if Arc::ptr_eq(&self.layout, &other.layout) {
            return Ok(());
        }
        TrainError::check_len("histogram features", self.layout.n_features(), other.layout.n_features())?;
        for f in 0..self.layout.n_features() {
            TrainError::check_len(
                "histogram thresholds",
                self.layout.thresholds[f].len(),
                other.layout.thresholds[f].len(),
            )?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn layout(&self) -> &HistogramLayout {
        &self.layout
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.layout.n_features()
    }

    /// Samples owned by this node.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[inline]
    pub fn sum(&self, f: usize) -> &[f64] {
        &self.sum[f]
    }

    #[inline]
    pub fn count(&self, f: usize) -> &[u32] {
        &self.count[f]
    }

    #[inline]
    pub fn sum_response(&self) -> f64 {
        self.sum_response
    }

    #[inline]
    pub fn sq_sum_response(&self) -> f64 {
        self.sq_sum_response
    }

    /// Mean pseudo-label of the node, 0 when empty.
    pub fn mean_response(&self) -> f64 {
        if self.n_samples == 0 {
            0.0
        } else {
            self.sum_response / self.n_samples as f64
        }
    }

    /// Sum of squared deviations of the pseudo-labels from their mean.
    pub fn deviance(&self) -> f64 {
        if self.n_samples == 0 {
            return 0.0;
        }
        self.sq_sum_response - self.sum_response * self.sum_response / self.n_samples as f64
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn scan_feature(
    samples: &TrainingSamples,
    f: usize,
    sorted: &[u32],
    labels: &[f64],
    candidates: ThresholdCandidates,
) -> FeatureScan {
    let column = samples.feature_values(f);
    let thresholds = candidate_thresholds(sorted.iter().map(|&k| column[k as usize]), candidates);
    let last = thresholds.len() - 1;

    let mut buckets = vec![0u32; samples.n_samples()];
    let mut sum = Vec::with_capacity(thresholds.len());
    let mut count = Vec::with_capacity(thresholds.len());

    let mut sum_left = 0.0;
    let mut j = 0;
    for (t, &threshold) in thresholds.iter().enumerate() {
        while j < sorted.len() {
            let k = sorted[j] as usize;
            // The final bucket also absorbs values above f32::MAX.
            if t < last && column[k] > threshold {
                break;
            }
            sum_left += labels[k];
            buckets[k] = t as u32;
            j += 1;
        }
        sum.push(sum_left);
        count.push(j as u32);
    }

    FeatureScan { thresholds, buckets, sum, count }
}

fn response_sums(labels: impl Iterator<Item = f64>) -> (f64, f64) {
    labels.fold((0.0, 0.0), |(s, sq), l| (s + l, sq + l * l))
}

#[inline]
fn prefix_sum(values: &mut [f64]) {
    for t in 1..values.len() {
        values[t] += values[t - 1];
    }
}

#[inline]
fn prefix_count(values: &mut [u32]) {
    for t in 1..values.len() {
        values[t] += values[t - 1];
    }
}
