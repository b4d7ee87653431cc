//! Model representation: regression trees and ensembles.

mod ensemble;
mod tree;

pub use ensemble::{Ensemble, Ranker};
pub use tree::{Node, NodeId, RegressionTree, TreeValidationError};
