//! Leaf-budgeted regression tree growth.
//!
//! The grower repeatedly takes the open leaf with the largest deviance,
//! searches its histogram for the best split and, if one exists, replaces it
//! with a split node and two new leaves. Growth ends when the leaf budget is
//! reached or no open leaf can be split.
//!
//! Only the smaller child of each split is scanned from its samples; the
//! larger one is derived by subtraction from the parent. The root histogram is
//! borrowed from the trainer (it is refreshed every round), so the first
//! subtraction allocates; deeper ones reuse the parent's storage.

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::repr::{Node, NodeId, RegressionTree};
use crate::training::sampling::FeatureSampler;
use crate::training::TrainError;
use crate::utils::TaskRunner;

use super::histogram::FeatureHistogram;
use super::split::{find_best_split, partition_samples};

/// Parameters for tree growth.
#[derive(Debug, Clone)]
pub struct GrowerParams {
    /// Maximum number of leaves per tree.
    pub n_leaves: usize,
    /// Minimum samples on each side of a split.
    pub min_leaf_support: usize,
    /// Fraction of features offered to each split search.
    pub feature_sampling_rate: f64,
    /// Seed of the feature-sampling stream.
    pub seed: u64,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            n_leaves: 10,
            min_leaf_support: 1,
            feature_sampling_rate: 1.0,
            seed: 42,
        }
    }
}

/// Samples that ended up in one leaf of a grown tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSamples {
    pub node: NodeId,
    pub samples: Vec<u32>,
}

/// One applied split, for feature-impact accounting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRecord {
    /// Feature position in the histogram layout.
    pub feature: usize,
    /// `deviance(parent) - deviance(left) - deviance(right)`.
    pub gain: f64,
}

/// A freshly grown tree together with its construction-time bookkeeping.
///
/// Leaf values start as the mean pseudo-label of each leaf; the trainer
/// replaces them with the objective's leaf output.
#[derive(Debug, Clone)]
pub struct GrownTree {
    pub tree: RegressionTree,
    pub leaves: Vec<LeafSamples>,
    pub splits: Vec<SplitRecord>,
}

/// An open leaf during growth.
struct OpenLeaf<'h> {
    node: NodeId,
    samples: Vec<u32>,
    hist: Cow<'h, FeatureHistogram>,
    deviance: f64,
}

enum SplitOutcome<'h> {
    Split(OpenLeaf<'h>, OpenLeaf<'h>),
    Leaf(OpenLeaf<'h>),
}

/// Grows one regression tree per boosting round.
pub struct TreeGrower {
    params: GrowerParams,
    sampler: FeatureSampler,
}

impl TreeGrower {
    pub fn new(params: GrowerParams, n_features: usize) -> Self {
        let sampler = FeatureSampler::new(n_features, params.feature_sampling_rate, params.seed);
        Self { params, sampler }
    }

    pub fn params(&self) -> &GrowerParams {
        &self.params
    }

    /// Grow a tree over all samples of `root`, fitting `labels`.
    ///
    /// The root split is always attempted. Afterwards the open leaf with the
    /// largest deviance is split next; leaves that cannot be split are
    /// closed and still count towards the budget.
    pub fn grow(
        &mut self,
        root: &FeatureHistogram,
        labels: &[f64],
        runner: &TaskRunner,
    ) -> Result<GrownTree, TrainError> {
        let n_samples = root.n_samples();
        let mut nodes = vec![Node::Leaf { value: root.mean_response() }];
        let mut closed: Vec<LeafSamples> = Vec::new();
        let mut splits: Vec<SplitRecord> = Vec::new();
        let mut queue: VecDeque<OpenLeaf<'_>> = VecDeque::new();

        let root_leaf = OpenLeaf {
            node: 0,
            samples: (0..n_samples as u32).collect(),
            hist: Cow::Borrowed(root),
            deviance: f64::INFINITY,
        };
        match self.try_split(root_leaf, labels, &mut nodes, &mut splits, runner)? {
            SplitOutcome::Split(left, right) => {
                enqueue(&mut queue, left);
                enqueue(&mut queue, right);
            }
            SplitOutcome::Leaf(leaf) => closed.push(close(leaf)),
        }

        while closed.len() + queue.len() < self.params.n_leaves {
            let Some(leaf) = queue.pop_front() else { break };
            if leaf.samples.len() < 2 * self.params.min_leaf_support {
                closed.push(close(leaf));
                continue;
            }
            match self.try_split(leaf, labels, &mut nodes, &mut splits, runner)? {
                SplitOutcome::Split(left, right) => {
                    enqueue(&mut queue, left);
                    enqueue(&mut queue, right);
                }
                SplitOutcome::Leaf(leaf) => closed.push(close(leaf)),
            }
        }
        closed.extend(queue.into_iter().map(close));
        closed.sort_by_key(|l| l.node);

        Ok(GrownTree {
            tree: RegressionTree::from_nodes(nodes),
            leaves: closed,
            splits,
        })
    }

    fn try_split<'h>(
        &mut self,
        leaf: OpenLeaf<'h>,
        labels: &[f64],
        nodes: &mut Vec<Node>,
        splits: &mut Vec<SplitRecord>,
        runner: &TaskRunner,
    ) -> Result<SplitOutcome<'h>, TrainError> {
        // A pure node has nothing left to explain.
        if leaf.deviance == 0.0 {
            return Ok(SplitOutcome::Leaf(leaf));
        }

        let features = self.sampler.sample();
        let Some(best) = find_best_split(&leaf.hist, &features, self.params.min_leaf_support, runner)? else {
            return Ok(SplitOutcome::Leaf(leaf));
        };

        let (left_samples, right_samples) = partition_samples(&leaf.hist, &best, &leaf.samples);
        let parent_deviance = leaf.hist.deviance();
        let scan_left = left_samples.len() <= right_samples.len();
        let smaller = if scan_left { &left_samples } else { &right_samples };
        let small_hist = FeatureHistogram::from_subset(&leaf.hist, smaller, labels, runner)?;
        let large_hist = match leaf.hist {
            Cow::Borrowed(parent) => FeatureHistogram::subtract(parent, &small_hist, runner)?,
            Cow::Owned(parent) => FeatureHistogram::subtract_in_place(parent, &small_hist, runner)?,
        };
        let (left_hist, right_hist) = if scan_left {
            (small_hist, large_hist)
        } else {
            (large_hist, small_hist)
        };

        let layout_feature = left_hist.layout().feature_id(best.feature);
        let threshold = left_hist.layout().thresholds(best.feature)[best.threshold];
        let left_deviance = left_hist.deviance();
        let right_deviance = right_hist.deviance();

        let left_id = nodes.len() as NodeId;
        let right_id = left_id + 1;
        nodes.push(Node::Leaf { value: left_hist.mean_response() });
        nodes.push(Node::Leaf { value: right_hist.mean_response() });
        nodes[leaf.node as usize] = Node::Split {
            feature: layout_feature,
            threshold,
            deviance: parent_deviance,
            left: left_id,
            right: right_id,
        };
        splits.push(SplitRecord {
            feature: best.feature,
            gain: parent_deviance - left_deviance - right_deviance,
        });

        let left = OpenLeaf {
            node: left_id,
            samples: left_samples,
            hist: Cow::Owned(left_hist),
            deviance: left_deviance,
        };
        let right = OpenLeaf {
            node: right_id,
            samples: right_samples,
            hist: Cow::Owned(right_hist),
            deviance: right_deviance,
        };
        Ok(SplitOutcome::Split(left, right))
    }
}

/// Insert keeping the queue ordered by deviance, largest first.
///
/// A new leaf goes before the first leaf whose deviance is not larger than
/// its own, so among equal deviances the newest is taken first.
fn enqueue<'h>(queue: &mut VecDeque<OpenLeaf<'h>>, leaf: OpenLeaf<'h>) {
    let pos = queue
        .iter()
        .position(|open| open.deviance <= leaf.deviance)
        .unwrap_or(queue.len());
    queue.insert(pos, leaf);
}

/// Drop the histogram of a leaf that will not be split any further.
fn close(leaf: OpenLeaf<'_>) -> LeafSamples {
    LeafSamples { node: leaf.node, samples: leaf.samples }
}
