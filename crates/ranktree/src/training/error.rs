//! Errors raised while setting up or running a training run.

use thiserror::Error;

use crate::data::DataError;

/// Training failure.
///
/// Degenerate data (pure nodes, no feasible split) is not an error; tree
/// growth simply stops. Everything here aborts the run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("invalid parameter `{param}`: {reason}")]
    InvalidConfig { param: &'static str, reason: String },

    #[error("training set has no items")]
    EmptyTrainingSet,

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("worker task `{task}` panicked: {message}")]
    WorkerPanicked { task: &'static str, message: String },

    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrainError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { param, reason: reason.into() }
    }

    /// Fail with [`TrainError::ShapeMismatch`] unless `actual == expected`.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::ShapeMismatch { what, expected, actual })
        }
    }
}
