//! Training infrastructure for boosted ranking trees.
//!
//! ## Shared Infrastructure
//!
//! - [`TrainError`]: Errors raised while preparing or running training
//! - [`EarlyStopping`]: Tracks the best validation round
//! - [`TrainingLogger`], [`Verbosity`]: Structured logging
//! - [`FeatureSampler`]: Per-split feature sub-sampling
//! - [`FeatureImportance`]: Accumulated split impact per feature
//!
//! ## Boosting
//!
//! - [`gbdt`]: Histogram-based tree growth and the boosting loop

mod callback;
mod error;
pub mod gbdt;
mod importance;
mod logger;
pub mod sampling;

pub use callback::{EarlyStopAction, EarlyStopping};
pub use error::TrainError;
pub use importance::{FeatureImportance, ImportanceEntry};
pub use logger::{TrainingLogger, Verbosity};
pub use sampling::FeatureSampler;

pub use gbdt::{
    BoostParams, BoostedTrainer, LambdaMart, LambdaObjective, Mart, PointwiseObjective, RankObjective,
    RoundMetrics, ThresholdCandidates, TrainingResult,
};
