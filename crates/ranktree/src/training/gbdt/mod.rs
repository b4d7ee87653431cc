//! Histogram-based gradient-boosted regression trees for ranking.
//!
//! - [`FeatureHistogram`]: cumulative per-threshold statistics with
//!   parent/sibling subtraction
//! - [`TreeGrower`]: leaf-budgeted greedy tree growth
//! - [`RankObjective`]: pseudo-labels and leaf outputs ([`LambdaObjective`],
//!   [`PointwiseObjective`])
//! - [`BoostedTrainer`]: the boosting loop with early stopping and rollback

mod grower;
mod histogram;
mod objective;
mod samples;
mod split;
mod thresholds;
mod trainer;

pub use grower::{GrowerParams, GrownTree, LeafSamples, SplitRecord, TreeGrower};
pub use histogram::{FeatureHistogram, HistogramLayout};
pub use objective::{LambdaObjective, PointwiseObjective, RankObjective};
pub use samples::TrainingSamples;
pub use split::{find_best_split, partition_samples, SplitCandidate};
pub use thresholds::ThresholdCandidates;
pub use trainer::{BoostParams, BoostedTrainer, LambdaMart, Mart, RoundMetrics, TrainingResult};
