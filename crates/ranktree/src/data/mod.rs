//! Ranking data: items, feature vectors and labeled lists.
//!
//! - [`DataPoint`]: one labeled item with a query id and a feature vector
//! - [`Features`]: dense or sparse storage behind the [`FeatureVector`] trait
//! - [`RankList`]: the items of one query, the unit of training and evaluation
//!
//! Feature ids are 1-based throughout the crate. Whether a feature that is not
//! stored in a vector reads as `0.0` or as an error is controlled per item by
//! [`MissingPolicy`], chosen once at load time.

mod error;
mod point;
mod rank_list;

pub use error::DataError;
pub use point::{DataPoint, DenseFeatures, FeatureVector, Features, MissingPolicy, SparseFeatures};
pub use rank_list::{feature_ids, RankList};
pub(crate) use rank_list::rank_order;
