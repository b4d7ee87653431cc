//! Errors raised while building or reading ranking data.

/// Errors from feature access and labeled-list construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    /// The feature id is not stored and the item's policy forbids defaulting to zero.
    #[error("feature {fid} is not present (item has features up to {max_fid})")]
    MissingFeature { fid: u32, max_fid: u32 },

    /// Feature id 0 or beyond the vector's range was used for a write.
    #[error("feature id {fid} out of range 1..={max_fid}")]
    FeatureOutOfRange { fid: u32, max_fid: u32 },

    /// Sparse vectors cannot grow new entries through `set`.
    #[error("sparse vector has no entry for feature {0}")]
    UnknownSparseFeature(u32),

    /// Sparse ids must be strictly increasing and non-zero.
    #[error("sparse feature ids must be strictly increasing and >= 1, got {0:?}")]
    UnsortedSparseIds(Vec<u32>),

    /// Sparse ids and values must be parallel arrays.
    #[error("sparse vector has {ids} ids but {values} values")]
    SparseLengthMismatch { ids: usize, values: usize },

    /// Every item of a labeled list must share its query id.
    #[error("item with qid {found:?} placed in list {expected:?}")]
    QueryMismatch { expected: String, found: String },

    /// A permutation passed to a list has the wrong length or repeats an index.
    #[error("invalid ordering for list of {len} items")]
    InvalidOrder { len: usize },
}
