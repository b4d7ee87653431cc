//! Regression tree stored as a flat node arena.
//!
//! Node 0 is the root. Split nodes reference their children by index; a
//! sample goes left iff its feature value is `<=` the split threshold.

use serde::{Deserialize, Serialize};

use crate::data::DataPoint;

/// Index of a node within its tree.
pub type NodeId = u32;

/// One node of a [`RegressionTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        /// 1-based feature id.
        feature: u32,
        threshold: f32,
        /// Squared-error deviance of the node's pseudo-labels before the split.
        deviance: f64,
        left: NodeId,
        right: NodeId,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Structural problems found by [`RegressionTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,
    #[error("node {node} has {side} child {child} outside 0..{n_nodes}")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
}

/// A binary regression tree over 1-based feature ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Tree from a node arena with the root at index 0.
    ///
    /// The arena is not checked; call [`validate`](Self::validate) on
    /// untrusted input.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// A tree that outputs `value` for every item.
    pub fn constant(value: f64) -> Self {
        Self { nodes: vec![Node::Leaf { value }] }
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Output for an item whose feature values are given by `feature_value(fid)`.
    #[inline]
    pub fn eval_with(&self, feature_value: impl Fn(u32) -> f32) -> f64 {
        let mut id = 0usize;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right, .. } => {
                    let next = if feature_value(*feature) <= *threshold { *left } else { *right };
                    id = next as usize;
                }
            }
        }
    }

    /// Output for `item`; features it lacks read as zero.
    #[inline]
    pub fn eval(&self, item: &DataPoint) -> f64 {
        self.eval_with(|fid| item.value_or_zero(fid))
    }

    /// Leaf ids in left-to-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![0 as NodeId];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Node::Leaf { .. } => out.push(id),
                Node::Split { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        out
    }

    /// Overwrite the output of a leaf. Does nothing for split nodes.
    pub fn set_leaf_value(&mut self, id: NodeId, new_value: f64) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(id as usize) {
            *value = new_value;
        }
    }

    /// Feature ids used by any split, ascending and deduplicated.
    pub fn features(&self) -> Vec<u32> {
        let mut features: Vec<u32> = self
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .collect();
        features.sort_unstable();
        features.dedup();
        features
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = self.node(id) {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Check that every node is reachable from the root along exactly one path.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let mut seen = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut seen[node as usize], true) {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            if let Node::Split { left, right, .. } = &self.nodes[node as usize] {
                for (side, child) in [("left", *left), ("right", *right)] {
                    if child as usize >= n_nodes {
                        return Err(TreeValidationError::ChildOutOfBounds { node, side, child, n_nodes });
                    }
                    stack.push(child);
                }
            }
        }

        match seen.iter().position(|&s| !s) {
            Some(i) => Err(TreeValidationError::UnreachableNode { node: i as NodeId }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f1 <= 3 ? (f2 <= 0.5 ? 1 : 2) : 3
    fn tree() -> RegressionTree {
        RegressionTree::from_nodes(vec![
            Node::Split { feature: 1, threshold: 3.0, deviance: 1.0, left: 1, right: 2 },
            Node::Split { feature: 2, threshold: 0.5, deviance: 0.5, left: 3, right: 4 },
            Node::Leaf { value: 3.0 },
            Node::Leaf { value: 1.0 },
            Node::Leaf { value: 2.0 },
        ])
    }

    #[test]
    fn routes_left_on_less_or_equal() {
        let t = tree();
        assert_eq!(t.eval(&DataPoint::dense(0.0, "q", vec![3.0, 0.5])), 1.0);
        assert_eq!(t.eval(&DataPoint::dense(0.0, "q", vec![3.0, 0.6])), 2.0);
        assert_eq!(t.eval(&DataPoint::dense(0.0, "q", vec![3.1, 0.0])), 3.0);
        // Absent feature 2 reads as zero.
        assert_eq!(t.eval(&DataPoint::dense(0.0, "q", vec![1.0])), 1.0);
    }

    #[test]
    fn structure_queries() {
        let t = tree();
        assert_eq!(t.leaves(), vec![3, 4, 2]);
        assert_eq!(t.n_leaves(), 3);
        assert_eq!(t.features(), vec![1, 2]);
        assert_eq!(t.depth(), 2);
        assert!(t.validate().is_ok());
        assert_eq!(RegressionTree::constant(0.5).depth(), 0);
    }

    #[test]
    fn set_leaf_value_ignores_splits() {
        let mut t = tree();
        t.set_leaf_value(2, -1.0);
        t.set_leaf_value(0, 9.0);
        assert_eq!(t.node(2), &Node::Leaf { value: -1.0 });
        assert!(!t.node(0).is_leaf());
    }

    #[test]
    fn validate_catches_bad_arenas() {
        assert_eq!(RegressionTree::from_nodes(vec![]).validate(), Err(TreeValidationError::EmptyTree));

        let out_of_bounds = RegressionTree::from_nodes(vec![Node::Split {
            feature: 1,
            threshold: 0.0,
            deviance: 0.0,
            left: 1,
            right: 5,
        }, Node::Leaf { value: 0.0 }]);
        assert!(matches!(
            out_of_bounds.validate(),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", child: 5, .. })
        ));

        let shared = RegressionTree::from_nodes(vec![
            Node::Split { feature: 1, threshold: 0.0, deviance: 0.0, left: 1, right: 1 },
            Node::Leaf { value: 0.0 },
        ]);
        assert!(matches!(shared.validate(), Err(TreeValidationError::DuplicateVisit { node: 1 })));

        let orphan = RegressionTree::from_nodes(vec![Node::Leaf { value: 0.0 }, Node::Leaf { value: 1.0 }]);
        assert_eq!(orphan.validate(), Err(TreeValidationError::UnreachableNode { node: 1 }));
    }
}
