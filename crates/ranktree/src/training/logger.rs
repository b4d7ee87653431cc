//! Training progress logging.
//!
//! [`TrainingLogger`] emits structured `tracing` events at the levels allowed
//! by a [`Verbosity`]. The crate never installs a subscriber; applications
//! choose where the events go.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How much the trainer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// No output.
    Silent,
    /// Only warnings (e.g. early stopping).
    Warning,
    /// Per-round metrics and the final report.
    #[default]
    Info,
    /// Everything, including per-tree diagnostics.
    Debug,
}

/// Emits training progress events.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity, started: None }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    pub fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    pub fn start_training(&mut self, learner: &str, n_trees: usize, n_samples: usize, n_features: usize) {
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            info!(learner, n_trees, n_samples, n_features, "training started");
        }
    }

    /// One line per boosting round.
    pub fn log_round(&self, metric: &str, round: usize, train: f64, validation: Option<f64>) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        match validation {
            Some(validation) => info!(round = round + 1, metric, train, validation, "round"),
            None => info!(round = round + 1, metric, train, "round"),
        }
    }

    pub fn log_tree(&self, round: usize, n_leaves: usize, n_splits: usize) {
        if self.enabled(Verbosity::Debug) {
            debug!(round = round + 1, n_leaves, n_splits, "tree grown");
        }
    }

    pub fn log_early_stopping(&self, round: usize, best_round: usize, metric: &str) {
        if self.enabled(Verbosity::Warning) {
            warn!(
                round = round + 1,
                best_round = best_round + 1,
                metric,
                "early stopping: no validation improvement"
            );
        }
    }

    pub fn log_rollback(&self, from_trees: usize, to_trees: usize) {
        if self.enabled(Verbosity::Info) && from_trees != to_trees {
            info!(from_trees, to_trees, "rolled back to best validation round");
        }
    }

    pub fn finish_training(&self, metric: &str, train: f64, validation: Option<f64>) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        let elapsed_ms = self.started.map_or(0, |t| t.elapsed().as_millis() as u64);
        match validation {
            Some(validation) => info!(metric, train, validation, elapsed_ms, "training finished"),
            None => info!(metric, train, elapsed_ms, "training finished"),
        }
    }

    /// Features in descending order of accumulated error reduction.
    pub fn log_feature_impacts(&self, impacts: &[(u32, f64)]) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        for &(feature, impact) in impacts {
            info!(feature, impact, "feature impact");
        }
    }
}
