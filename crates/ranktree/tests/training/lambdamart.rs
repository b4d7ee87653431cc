//! Pairwise-lambda (LambdaMART) training.

use rstest::rstest;

use ranktree::metric::mean_score;
use ranktree::{
    AveragePrecision, BoostParams, BoostedTrainer, Dcg, MetricScorer, Ndcg, Precision, Ranker, TaskRunner, Verbosity,
};

use super::{init_tracing, quiet, synthetic};

#[rstest]
#[case::ndcg(Box::new(Ndcg::new(10)))]
#[case::dcg(Box::new(Dcg::new(10)))]
#[case::precision(Box::new(Precision::new(5)))]
#[case::map(Box::new(AveragePrecision))]
fn training_beats_input_order(#[case] metric: Box<dyn MetricScorer>) {
    let lists = synthetic(30, 20, 11);
    let baseline = mean_score(&metric, &lists);
    let params = quiet(BoostParams { n_trees: 30, n_leaves: 8, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(metric, params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();

    assert_eq!(result.ensemble.len(), 30);
    assert!(result.train_score > baseline, "{} <= {}", result.train_score, baseline);
    let last = result.history.last().unwrap();
    assert!((last.train - result.train_score).abs() < 1e-12);
}

#[test]
fn ranking_orders_by_score() {
    let lists = synthetic(10, 15, 4);
    let params = quiet(BoostParams { n_trees: 10, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();

    let mut ranked = lists.clone();
    result.ensemble.rank_all(&mut ranked);
    for list in &ranked {
        let scores: Vec<f64> = list.iter().map(|item| item.cached_score()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
    let score = result.ensemble.score(&Ndcg::default(), &lists);
    assert!((score - mean_score(&Ndcg::default(), &ranked)).abs() < 1e-12);
}

#[test]
fn feature_importance_reports_used_features() {
    init_tracing();
    let lists = synthetic(12, 10, 21);
    let params = BoostParams { n_trees: 5, n_leaves: 5, verbosity: Verbosity::Debug, ..Default::default() };
    let result = BoostedTrainer::lambda_mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();

    let importance = &result.importance;
    assert_eq!(importance.len(), 5);
    assert_eq!(importance.used_features(), result.ensemble.features());
    let impacts: Vec<f64> = importance.entries().iter().map(|e| e.impact).collect();
    assert!(impacts.windows(2).all(|w| w[0] >= w[1]));
    let splits: u32 = importance.entries().iter().map(|e| e.splits).sum();
    let split_nodes: usize = result.ensemble.trees().iter().map(|t| t.n_nodes() - t.n_leaves()).sum();
    assert_eq!(splits as usize, split_nodes);
    let total: f64 = importance.normalized().iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn feature_sampling_still_trains() {
    let lists = synthetic(10, 10, 8);
    let params = quiet(BoostParams { n_trees: 10, feature_sampling_rate: 0.4, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();
    assert_eq!(result.ensemble.len(), 10);
    assert!(result.ensemble.n_leaves() > 10);
}
