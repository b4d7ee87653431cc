//! Point-wise (MART) training.

use approx::assert_abs_diff_eq;

use ranktree::repr::Node;
use ranktree::{BoostParams, BoostedTrainer, Ensemble, Ndcg, RankList, Ranker, TaskRunner};

use super::{quiet, synthetic, three_items};

fn squared_error(ensemble: &Ensemble, lists: &[RankList]) -> f64 {
    lists
        .iter()
        .flat_map(RankList::iter)
        .map(|item| (item.label() as f64 - ensemble.eval(item)).powi(2))
        .sum()
}

#[test]
fn three_items_split_at_value_three() {
    let params = quiet(BoostParams { n_trees: 1, n_leaves: 2, learning_rate: 1.0, ..Default::default() });
    let result = BoostedTrainer::mart(Ndcg::default(), params)
        .train(&three_items(), None, &TaskRunner::sequential())
        .unwrap();

    let tree = result.ensemble.tree(0);
    match tree.node(0) {
        Node::Split { feature, threshold, .. } => {
            assert_eq!(*feature, 1);
            assert_eq!(*threshold, 3.0);
        }
        other => panic!("expected a split at the root, got {other:?}"),
    }
    let lists = three_items();
    assert_abs_diff_eq!(tree.eval(&lists[0][0]), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(tree.eval(&lists[0][1]), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(tree.eval(&lists[0][2]), 0.5, epsilon = 1e-12);
}

#[test]
fn training_error_never_increases() {
    let lists = synthetic(15, 12, 5);
    let params = quiet(BoostParams { n_trees: 25, n_leaves: 6, learning_rate: 0.3, ..Default::default() });
    let result = BoostedTrainer::mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();
    assert_eq!(result.ensemble.len(), 25);

    let mut previous = squared_error(&Ensemble::new(), &lists);
    for n_trees in 1..=result.ensemble.len() {
        let mut prefix = result.ensemble.clone();
        prefix.truncate(n_trees);
        let error = squared_error(&prefix, &lists);
        assert!(error <= previous + 1e-9, "round {n_trees}: {error} > {previous}");
        previous = error;
    }
}

#[test]
fn trees_respect_leaf_budget_and_weights() {
    let lists = synthetic(10, 10, 9);
    let params = quiet(BoostParams { n_trees: 8, n_leaves: 4, learning_rate: 0.2, ..Default::default() });
    let result = BoostedTrainer::mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();
    for (tree, weight) in result.ensemble.iter() {
        assert!(tree.n_leaves() <= 4);
        assert!(tree.validate().is_ok());
        assert_eq!(weight, 0.2);
    }
    assert!(result.ensemble.features().iter().all(|fid| (1..=5).contains(fid)));
}

#[test]
fn min_leaf_support_is_honored() {
    let lists = synthetic(4, 10, 2);
    let params = quiet(BoostParams { n_trees: 3, n_leaves: 10, min_leaf_support: 8, ..Default::default() });
    let result = BoostedTrainer::mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();
    // 40 samples with at least 8 per leaf.
    for tree in result.ensemble.trees() {
        assert!(tree.n_leaves() <= 5);
    }
}
