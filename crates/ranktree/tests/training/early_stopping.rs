//! Best-round tracking and rollback.

use approx::assert_abs_diff_eq;

use ranktree::training::{EarlyStopAction, EarlyStopping};
use ranktree::{
    BoostParams, BoostedTrainer, DataPoint, Ensemble, Ndcg, Precision, RankList, RegressionTree, TaskRunner,
};

use super::{quiet, synthetic, three_items};

#[test]
fn flat_tail_rolls_back_to_peak() {
    // Improves through round 2, then flat for rounds 3..5.
    let validation = [0.5, 0.6, 0.7, 0.7, 0.7];
    let mut early = EarlyStopping::new(2, true);
    let mut ensemble = Ensemble::new();
    for (round, &value) in validation.iter().enumerate() {
        ensemble.add(RegressionTree::constant(round as f64), 0.1);
        if early.update(value) == EarlyStopAction::Stop {
            break;
        }
    }
    assert_eq!(ensemble.len(), 5);
    let best = early.best_round().unwrap();
    ensemble.truncate(best + 1);
    assert_eq!(ensemble.len(), 3);
}

#[test]
fn final_model_is_the_best_validation_round() {
    let lists = synthetic(24, 10, 77);
    let (train, validation) = lists.split_at(16);
    let params = quiet(BoostParams { n_trees: 40, n_leaves: 12, learning_rate: 0.5, early_stopping_rounds: 5, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Ndcg::new(5), params)
        .train(train, Some(validation), &TaskRunner::sequential())
        .unwrap();

    let best = result.best_round.unwrap();
    assert_eq!(result.ensemble.len(), best + 1);

    let values: Vec<f64> = result.history.iter().map(|m| m.validation.unwrap()).collect();
    let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // The first round reaching the peak wins.
    assert_eq!(values.iter().position(|&v| v == peak), Some(best));
    assert!((result.validation_score.unwrap() - peak).abs() < 1e-12);

    // An early stop happens on the first round more than `window` rounds past the best.
    assert!(result.history.len() <= best + 5 + 2);
    if result.history.len() < 40 {
        assert_eq!(result.history.len(), best + 5 + 2);
    }
}

#[test]
fn trainer_rolls_back_after_plateau() {
    // Stumps at learning rate 1 on x = 1..6. Each validation list holds a
    // relevant and an irrelevant item; P@1 over the three lists is
    // 1/3, 2/3, 1, 1, 1 across the five rounds.
    let train = vec![RankList::new(
        [2.0, 0.0, 3.0, 1.0, 1.0, 1.0]
            .into_iter()
            .zip(1..=6)
            .map(|(label, x)| DataPoint::dense(label, "q", vec![x as f32]))
            .collect(),
    )
    .unwrap()];
    let pair = |qid: &str, relevant: f32, other: f32| {
        RankList::new(vec![
            DataPoint::dense(1.0, qid, vec![relevant]),
            DataPoint::dense(0.0, qid, vec![other]),
        ])
        .unwrap()
    };
    let validation = vec![pair("v1", 1.0, 4.0), pair("v2", 4.0, 2.0), pair("v3", 5.0, 2.0)];

    let params = quiet(BoostParams {
        n_trees: 5,
        n_leaves: 2,
        learning_rate: 1.0,
        early_stopping_rounds: 2,
        ..Default::default()
    });
    let result = BoostedTrainer::mart(Precision::new(1), params)
        .train(&train, Some(&validation), &TaskRunner::sequential())
        .unwrap();

    let values: Vec<f64> = result.history.iter().map(|m| m.validation.unwrap()).collect();
    let expected = [1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 1.0];
    assert_eq!(values.len(), expected.len());
    for (value, expected) in values.iter().zip(expected) {
        assert_abs_diff_eq!(*value, expected, epsilon = 1e-12);
    }
    assert_eq!(result.best_round, Some(2));
    assert_eq!(result.ensemble.len(), 3);
    assert_abs_diff_eq!(result.validation_score.unwrap(), 1.0, epsilon = 1e-12);
}

#[test]
fn zero_window_stops_on_first_round_without_improvement() {
    // Validation prefers the reverse of the training order, so P@1 is 0 from
    // the first round on.
    let validation = vec![RankList::new(vec![
        DataPoint::dense(0.0, "v", vec![5.0]),
        DataPoint::dense(2.0, "v", vec![1.0]),
        DataPoint::dense(1.0, "v", vec![3.0]),
    ])
    .unwrap()];
    let params = quiet(BoostParams { n_trees: 6, n_leaves: 2, early_stopping_rounds: 0, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Precision::new(1), params)
        .train(&three_items(), Some(&validation), &TaskRunner::sequential())
        .unwrap();

    assert_eq!(result.best_round, Some(0));
    assert_eq!(result.history.len(), 2);
    assert_eq!(result.ensemble.len(), 1);
}

#[test]
fn zero_window_keeps_training_while_improving() {
    let mut early = EarlyStopping::new(0, true);
    for value in [0.1, 0.2, 0.3] {
        assert_eq!(early.update(value), EarlyStopAction::Improved);
    }
    assert_eq!(early.update(0.3), EarlyStopAction::Stop);
    assert_eq!(early.best_round(), Some(2));
}

#[test]
fn without_validation_nothing_is_rolled_back() {
    let lists = synthetic(8, 10, 3);
    let params = quiet(BoostParams { n_trees: 7, early_stopping_rounds: 1, ..Default::default() });
    let result = BoostedTrainer::lambda_mart(Ndcg::default(), params)
        .train(&lists, None, &TaskRunner::sequential())
        .unwrap();
    assert_eq!(result.ensemble.len(), 7);
    assert_eq!(result.best_round, None);
    assert_eq!(result.validation_score, None);
    assert!(result.history.iter().all(|m| m.validation.is_none()));
}
