//! Feature sub-sampling for split search.
//!
//! Each split search may look at a random subset of the features, drawn
//! without replacement. The subset is redrawn for every call, not once per
//! tree, from a single seeded stream so that a run is reproducible.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Draws feature subsets for successive split searches.
#[derive(Debug, Clone)]
pub struct FeatureSampler {
    n_features: usize,
    rate: f64,
    rng: Xoshiro256PlusPlus,
}

impl FeatureSampler {
    /// `rate` is the fraction of features kept per draw, in `(0, 1]`.
    pub fn new(n_features: usize, rate: f64, seed: u64) -> Self {
        Self {
            n_features,
            rate,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.rate < 1.0
    }

    /// Features kept per draw: `floor(rate * n_features)`, at least one.
    pub fn sample_size(&self) -> usize {
        if !self.is_enabled() {
            return self.n_features;
        }
        ((self.rate * self.n_features as f64).floor() as usize).clamp(1, self.n_features.max(1))
    }

    /// Feature positions for the next split search, ascending.
    pub fn sample(&mut self) -> Vec<usize> {
        let k = self.sample_size().min(self.n_features);
        if k == self.n_features {
            return (0..self.n_features).collect();
        }

        // Partial Fisher-Yates
        let mut positions: Vec<usize> = (0..self.n_features).collect();
        for i in 0..k {
            let j = self.rng.gen_range(i..self.n_features);
            positions.swap(i, j);
        }
        positions.truncate(k);
        positions.sort_unstable();
        positions
    }
}
