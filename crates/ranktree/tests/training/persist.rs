//! Serde round trips of trained models and parameters.

use ranktree::{BoostParams, BoostedTrainer, Ensemble, Ndcg, Ranker, TaskRunner, ThresholdCandidates, Verbosity};

use super::{quiet, synthetic};

#[test]
fn ensemble_round_trips_through_json() {
    let lists = synthetic(6, 8, 1);
    let params = quiet(BoostParams { n_trees: 4, n_leaves: 5, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();

    let json = serde_json::to_string(&result.ensemble).unwrap();
    let restored: Ensemble = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result.ensemble);
    for item in lists.iter().flat_map(|rl| rl.iter()) {
        assert_eq!(restored.eval(item), result.ensemble.eval(item));
    }
    assert!(restored.trees().iter().all(|t| t.validate().is_ok()));
}

#[test]
fn params_round_trip_and_fill_defaults() {
    let params = BoostParams {
        n_trees: 50,
        thresholds: ThresholdCandidates::All,
        verbosity: Verbosity::Warning,
        ..Default::default()
    };
    let json = serde_json::to_string(&params).unwrap();
    let restored: BoostParams = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, params);

    let partial: BoostParams = serde_json::from_str(r#"{ "n_trees": 7, "learning_rate": 0.05 }"#).unwrap();
    assert_eq!(partial.n_trees, 7);
    assert_eq!(partial.learning_rate, 0.05);
    assert_eq!(partial.n_leaves, BoostParams::default().n_leaves);
}
