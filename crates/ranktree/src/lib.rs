//! ranktree: gradient-boosted regression trees for learning to rank.
//!
//! Fits LambdaMART (pairwise lambda gradients weighted by metric swap
//! deltas) and MART (point-wise least squares) ensembles on labeled query
//! lists, using cumulative feature histograms with parent/sibling
//! subtraction for fast split search.
//!
//! # Key Types
//!
//! - [`RankList`] / [`DataPoint`] - Labeled lists of items
//! - [`MetricScorer`] - Ranking metrics with swap deltas ([`Ndcg`], [`Dcg`], ...)
//! - [`BoostedTrainer`] / [`BoostParams`] - Training ([`LambdaMart`], [`Mart`])
//! - [`Ensemble`] / [`Ranker`] - The trained model
//! - [`TaskRunner`] - Worker pool shared by all parallel phases
//!
//! # Training
//!
//! ```
//! use ranktree::testing::{synthetic_rank_lists, SyntheticLists};
//! use ranktree::{BoostParams, BoostedTrainer, Ndcg, TaskRunner, Verbosity};
//!
//! let lists = synthetic_rank_lists(SyntheticLists::default(), 1).unwrap();
//! let params = BoostParams { n_trees: 10, verbosity: Verbosity::Silent, ..Default::default() };
//! let trainer = BoostedTrainer::lambda_mart(Ndcg::new(10), params);
//! let result = trainer.train(&lists, None, &TaskRunner::sequential()).unwrap();
//! assert_eq!(result.ensemble.len(), 10);
//! ```

pub mod data;
pub mod metric;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Data types
pub use data::{DataError, DataPoint, FeatureVector, Features, MissingPolicy, RankList};

// Metrics
pub use metric::{AveragePrecision, Dcg, MetricScorer, Ndcg, Precision};

// Model types
pub use repr::{Ensemble, Node, Ranker, RegressionTree};

// Training types
pub use training::{
    BoostParams, BoostedTrainer, FeatureImportance, LambdaMart, Mart, ThresholdCandidates, TrainError,
    TrainingResult, Verbosity,
};

// Shared utilities
pub use utils::TaskRunner;
