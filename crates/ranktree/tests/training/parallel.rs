//! Results must not depend on the worker-pool size.

use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use rstest::rstest;

use ranktree::training::gbdt::{FeatureHistogram, LambdaObjective, RankObjective, TrainingSamples};
use ranktree::{
    BoostParams, BoostedTrainer, DataPoint, Ndcg, RankList, TaskRunner, ThresholdCandidates, TrainError,
};

use super::{quiet, synthetic};

#[rstest]
#[case::lambda_mart(false)]
#[case::mart(true)]
fn training_is_pool_size_invariant(#[case] pointwise: bool) {
    let lists = synthetic(16, 12, 31);
    let (train, validation) = lists.split_at(12);
    let params = quiet(BoostParams {
        n_trees: 12,
        n_leaves: 7,
        feature_sampling_rate: 0.6,
        early_stopping_rounds: 4,
        ..Default::default()
    });

    let run = |threads: usize| {
        let runner = TaskRunner::new(threads).unwrap();
        let result = if pointwise {
            BoostedTrainer::mart(Ndcg::default(), params.clone()).train(train, Some(validation), &runner)
        } else {
            BoostedTrainer::lambda_mart(Ndcg::default(), params.clone()).train(train, Some(validation), &runner)
        };
        result.unwrap()
    };

    let sequential = run(1);
    for threads in [2, 3, 8] {
        let parallel = run(threads);
        assert_eq!(parallel.ensemble, sequential.ensemble, "{threads} threads");
        assert_eq!(parallel.history, sequential.history, "{threads} threads");
        assert_eq!(parallel.importance, sequential.importance, "{threads} threads");
        assert_eq!(parallel.best_round, sequential.best_round);
    }
}

fn lists_from(groups: &[Vec<(f32, [f32; 2])>]) -> Vec<RankList> {
    groups
        .iter()
        .enumerate()
        .map(|(g, items)| {
            let qid = format!("q{g}");
            let items = items.iter().map(|(l, v)| DataPoint::dense(*l, qid.as_str(), v.to_vec())).collect();
            RankList::with_id(qid.as_str(), items).unwrap()
        })
        .collect()
}

fn arb_groups() -> impl Strategy<Value = Vec<Vec<(f32, [f32; 2])>>> {
    let item = ((0u8..4).prop_map(f32::from), prop::array::uniform2((0u8..10).prop_map(f32::from)));
    prop_vec(prop_vec(item, 1..8), 1..10)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn phases_match_across_pool_sizes(groups in arb_groups(), threads in 2usize..6) {
        let lists = lists_from(&groups);
        let samples = TrainingSamples::from_lists(&lists, &[1, 2]).unwrap();
        let n = samples.n_samples();
        let scores: Vec<f64> = (0..n).map(|k| ((k * 13 % 7) as f64 - 3.0) * 0.2).collect();
        let seq = TaskRunner::sequential();
        let par = TaskRunner::new(threads).unwrap();

        let lambdas = |runner: &TaskRunner| {
            let mut pseudo = vec![0.0; n];
            let mut weights = vec![0.0; n];
            LambdaObjective
                .compute_pseudo_labels(&Ndcg::new(5), &samples, &scores, &mut pseudo, &mut weights, runner)
                .unwrap();
            (pseudo, weights)
        };
        let (pseudo, weights) = lambdas(&seq);
        prop_assert_eq!((pseudo.clone(), weights), lambdas(&par));

        let a = FeatureHistogram::construct(&samples, &pseudo, ThresholdCandidates::Max(4), &seq).unwrap();
        let b = FeatureHistogram::construct(&samples, &pseudo, ThresholdCandidates::Max(4), &par).unwrap();
        for f in 0..2 {
            prop_assert_eq!(a.sum(f), b.sum(f));
            prop_assert_eq!(a.count(f), b.count(f));
        }
    }
}

#[test]
fn worker_panic_aborts_the_phase() {
    let runner = TaskRunner::new(4).unwrap();
    let err = runner
        .execute("explode", 8, |range| {
            if range.contains(&5) {
                panic!("bad chunk");
            }
            range.len()
        })
        .unwrap_err();
    match err {
        TrainError::WorkerPanicked { task, message } => {
            assert_eq!(task, "explode");
            assert_eq!(message, "bad chunk");
        }
        other => panic!("unexpected error {other:?}"),
    }
    // The pool survives a failed phase.
    assert_eq!(runner.execute("ok", 8, |range| range.len()).unwrap().iter().sum::<usize>(), 8);
}
