//! Boosted trainer for ranking.
//!
//! Orchestrates pseudo-label computation, histogram update, tree growth,
//! ensemble growth, validation scoring and early stopping. Use
//! [`BoostedTrainer::train`] to fit an [`Ensemble`] on labeled lists.

use serde::{Deserialize, Serialize};

use crate::data::{feature_ids, rank_order, RankList};
use crate::metric::{MetricScorer, Ndcg};
use crate::repr::{Ensemble, Ranker};
use crate::training::callback::{EarlyStopAction, EarlyStopping};
use crate::training::importance::FeatureImportance;
use crate::training::logger::{TrainingLogger, Verbosity};
use crate::training::TrainError;
use crate::utils::TaskRunner;

use super::grower::{GrowerParams, TreeGrower};
use super::histogram::FeatureHistogram;
use super::objective::{LambdaObjective, PointwiseObjective, RankObjective};
use super::samples::TrainingSamples;
use super::thresholds::ThresholdCandidates;

// =============================================================================
// BoostParams
// =============================================================================

/// Parameters for boosted training.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostParams {
    // --- Boosting parameters ---
    /// Number of boosting rounds (trees to train).
    pub n_trees: usize,
    /// Shrinkage applied to every tree.
    pub learning_rate: f64,

    // --- Tree structure ---
    /// Leaf budget per tree.
    pub n_leaves: usize,
    /// Minimum samples on each side of a split.
    pub min_leaf_support: usize,
    /// Candidate split thresholds per feature.
    pub thresholds: ThresholdCandidates,

    // --- Sampling ---
    /// Fraction of features offered to each split search, in `(0, 1]`.
    pub feature_sampling_rate: f64,

    // --- Early stopping ---
    /// Stop once the validation metric has not improved for this many rounds.
    /// With 0, the first round without improvement stops training.
    pub early_stopping_rounds: usize,

    // --- Logging ---
    pub verbosity: Verbosity,

    // --- Reproducibility ---
    pub seed: u64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_trees: 1000,
            learning_rate: 0.1,
            n_leaves: 10,
            min_leaf_support: 1,
            thresholds: ThresholdCandidates::default(),
            feature_sampling_rate: 1.0,
            early_stopping_rounds: 100,
            verbosity: Verbosity::default(),
            seed: 42,
        }
    }
}

impl BoostParams {
    /// Reject parameter combinations that cannot train.
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.n_trees == 0 {
            return Err(TrainError::invalid("n_trees", "at least one tree is required"));
        }
        if self.n_leaves < 2 {
            return Err(TrainError::invalid("n_leaves", format!("must be at least 2, got {}", self.n_leaves)));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::invalid(
                "learning_rate",
                format!("must be positive and finite, got {}", self.learning_rate),
            ));
        }
        if self.thresholds == ThresholdCandidates::Max(0) {
            return Err(TrainError::invalid("thresholds", "threshold budget must be positive"));
        }
        if self.min_leaf_support == 0 {
            return Err(TrainError::invalid("min_leaf_support", "must be at least 1"));
        }
        if !(self.feature_sampling_rate > 0.0 && self.feature_sampling_rate <= 1.0) {
            return Err(TrainError::invalid(
                "feature_sampling_rate",
                format!("must be in (0, 1], got {}", self.feature_sampling_rate),
            ));
        }
        Ok(())
    }

    fn to_grower_params(&self) -> GrowerParams {
        GrowerParams {
            n_leaves: self.n_leaves,
            min_leaf_support: self.min_leaf_support,
            feature_sampling_rate: self.feature_sampling_rate,
            seed: self.seed,
        }
    }
}

// =============================================================================
// Training output
// =============================================================================

/// Metric values after one boosting round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    pub round: usize,
    pub train: f64,
    pub validation: Option<f64>,
}

/// Everything a training run produces.
#[derive(Clone, Debug)]
pub struct TrainingResult {
    /// The model, rolled back to the best validation round when one was given.
    pub ensemble: Ensemble,
    pub importance: FeatureImportance,
    /// Per-round metrics, including rounds later rolled back.
    pub history: Vec<RoundMetrics>,
    /// Training metric of the final ensemble, by full re-evaluation.
    pub train_score: f64,
    /// Validation metric of the final ensemble, by full re-evaluation.
    pub validation_score: Option<f64>,
    /// Round with the best validation metric.
    pub best_round: Option<usize>,
}

// =============================================================================
// BoostedTrainer
// =============================================================================

/// Gradient-boosted regression trees for ranking.
///
/// The objective decides the boosting variant ([`LambdaMart`] or [`Mart`]);
/// the metric drives the lambda weights and the reported scores.
pub struct BoostedTrainer<O: RankObjective, M: MetricScorer> {
    objective: O,
    metric: M,
    params: BoostParams,
}

/// Pairwise-lambda boosting.
pub type LambdaMart<M = Ndcg> = BoostedTrainer<LambdaObjective, M>;

/// Point-wise least-squares boosting.
pub type Mart<M = Ndcg> = BoostedTrainer<PointwiseObjective, M>;

impl<M: MetricScorer> BoostedTrainer<LambdaObjective, M> {
    pub fn lambda_mart(metric: M, params: BoostParams) -> Self {
        Self::new(LambdaObjective, metric, params)
    }
}

impl<M: MetricScorer> BoostedTrainer<PointwiseObjective, M> {
    pub fn mart(metric: M, params: BoostParams) -> Self {
        Self::new(PointwiseObjective, metric, params)
    }
}

impl<O: RankObjective, M: MetricScorer> BoostedTrainer<O, M> {
    pub fn new(objective: O, metric: M, params: BoostParams) -> Self {
        Self { objective, metric, params }
    }

    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Train an ensemble on `train`, optionally early-stopping on `validation`.
    ///
    /// Feature ids are the union of those present in the training lists;
    /// every item of both sets must be readable at each of them under its
    /// missing-feature policy. Without validation data all rounds run and
    /// nothing is rolled back.
    pub fn train(
        &self,
        train: &[RankList],
        validation: Option<&[RankList]>,
        runner: &TaskRunner,
    ) -> Result<TrainingResult, TrainError> {
        self.params.validate()?;
        let validation = validation.filter(|lists| !lists.is_empty());

        let features = feature_ids(train);
        let samples = TrainingSamples::from_lists(train, &features)?;
        if features.is_empty() {
            return Err(TrainError::invalid("features", "training lists carry no features"));
        }
        if let Some(lists) = validation {
            for item in lists.iter().flat_map(RankList::iter) {
                for &fid in &features {
                    item.value(fid)?;
                }
            }
        }

        let n_samples = samples.n_samples();
        let n_features = samples.n_features();
        let lr = self.params.learning_rate;
        let metric_name = self.metric.name();

        let mut logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.objective.name(), self.params.n_trees, n_samples, n_features);

        let mut scores = vec![0.0f64; n_samples];
        let mut pseudo = vec![0.0f64; n_samples];
        let mut weights = vec![0.0f64; n_samples];
        let mut hist = FeatureHistogram::construct(&samples, &pseudo, self.params.thresholds, runner)?;
        let mut grower = TreeGrower::new(self.params.to_grower_params(), n_features);

        let mut validation_scores: Vec<Vec<f64>> = validation
            .map(|lists| lists.iter().map(|rl| vec![0.0; rl.len()]).collect())
            .unwrap_or_default();

        let mut ensemble = Ensemble::new();
        let mut impacts = vec![0.0f64; n_features];
        let mut split_counts = vec![0u32; n_features];
        let mut history = Vec::with_capacity(self.params.n_trees);
        let mut early_stopping = EarlyStopping::new(self.params.early_stopping_rounds, true);

        for round in 0..self.params.n_trees {
            self.objective
                .compute_pseudo_labels(&self.metric, &samples, &scores, &mut pseudo, &mut weights, runner)?;
            hist.update(&pseudo, runner)?;

            let grown = grower.grow(&hist, &pseudo, runner)?;
            let mut tree = grown.tree;
            for leaf in &grown.leaves {
                let output = self.objective.leaf_output(&leaf.samples, &pseudo, &weights);
                tree.set_leaf_value(leaf.node, output);
                for &k in &leaf.samples {
                    scores[k as usize] += lr * output;
                }
            }
            for split in &grown.splits {
                impacts[split.feature] += split.gain;
                split_counts[split.feature] += 1;
            }
            logger.log_tree(round, tree.n_leaves(), grown.splits.len());

            if let Some(lists) = validation {
                for (list, list_scores) in lists.iter().zip(validation_scores.iter_mut()) {
                    for (item, score) in list.iter().zip(list_scores.iter_mut()) {
                        *score += lr * tree.eval(item);
                    }
                }
            }
            ensemble.add(tree, lr);

            let train_metric = self.training_metric(&samples, &scores, runner)?;
            let validation_metric = validation.map(|lists| list_metric(&self.metric, lists, &validation_scores));
            history.push(RoundMetrics { round, train: train_metric, validation: validation_metric });
            logger.log_round(&metric_name, round, train_metric, validation_metric);

            if let Some(value) = validation_metric {
                if early_stopping.update(value) == EarlyStopAction::Stop {
                    let best = early_stopping.best_round().unwrap_or(round);
                    logger.log_early_stopping(round, best, &metric_name);
                    break;
                }
            }
        }

        let best_round = early_stopping.best_round();
        if let Some(best) = best_round {
            if best + 1 < ensemble.len() {
                logger.log_rollback(ensemble.len(), best + 1);
                ensemble.truncate(best + 1);
            }
        }

        let train_score = ensemble.score(&self.metric, train);
        let validation_score = validation.map(|lists| ensemble.score(&self.metric, lists));
        let importance = FeatureImportance::new(&features, &impacts, &split_counts);
        logger.log_feature_impacts(&importance.values());
        logger.finish_training(&metric_name, train_score, validation_score);

        Ok(TrainingResult {
            ensemble,
            importance,
            history,
            train_score,
            validation_score,
            best_round,
        })
    }

    /// Mean metric over the training groups at the current scores.
    ///
    /// Per-group values are computed in parallel and summed in group order.
    fn training_metric(&self, samples: &TrainingSamples, scores: &[f64], runner: &TaskRunner) -> Result<f64, TrainError> {
        let n_groups = samples.n_groups();
        let labels = samples.labels();
        let per_chunk = runner.execute("training-metric", n_groups, |groups| {
            groups
                .map(|g| {
                    let range = samples.group(g);
                    let group_labels = &labels[range.clone()];
                    let ranked: Vec<f32> = rank_order(&scores[range]).into_iter().map(|i| group_labels[i]).collect();
                    self.metric.score_labels(&ranked)
                })
                .collect::<Vec<_>>()
        })?;
        let total: f64 = per_chunk.into_iter().flatten().sum();
        Ok(total / n_groups as f64)
    }
}

/// Mean metric over `lists` ordered by externally held `scores`.
fn list_metric<M: MetricScorer + ?Sized>(metric: &M, lists: &[RankList], scores: &[Vec<f64>]) -> f64 {
    let total: f64 = lists
        .iter()
        .zip(scores)
        .map(|(list, list_scores)| {
            let ranked: Vec<f32> = rank_order(list_scores).into_iter().map(|i| list[i].label()).collect();
            metric.score_labels(&ranked)
        })
        .sum();
    total / lists.len() as f64
}
