//! Histogram invariants checked against direct scans.

use approx::assert_abs_diff_eq;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

use ranktree::training::gbdt::{find_best_split, FeatureHistogram, TrainingSamples};
use ranktree::{DataPoint, RankList, TaskRunner, ThresholdCandidates};

/// Rows of small integer-valued features (so values repeat) and labels.
fn arb_rows() -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<f64>)> {
    (1usize..4, 2usize..30).prop_flat_map(|(n_features, n_rows)| {
        (
            prop_vec(prop_vec((0u8..8).prop_map(f32::from), n_features), n_rows),
            prop_vec(-3.0f64..3.0, n_rows),
        )
    })
}

fn arb_candidates() -> impl Strategy<Value = ThresholdCandidates> {
    prop_oneof![Just(ThresholdCandidates::All), (1usize..6).prop_map(ThresholdCandidates::Max)]
}

fn samples(rows: &[Vec<f32>]) -> TrainingSamples {
    let items = rows.iter().map(|r| DataPoint::dense(0.0, "q", r.clone())).collect();
    let lists = vec![RankList::new(items).unwrap()];
    let features: Vec<u32> = (1..=rows[0].len() as u32).collect();
    TrainingSamples::from_lists(&lists, &features).unwrap()
}

/// `sum[f][t]` and `count[f][t]` over the samples of `subset` in buckets `<= t`.
fn assert_matches_scan(h: &FeatureHistogram, subset: &[u32], labels: &[f64]) {
    let layout = h.layout();
    for f in 0..h.n_features() {
        for t in 0..layout.thresholds(f).len() {
            let inside: Vec<u32> = subset.iter().copied().filter(|&k| layout.bucket(f, k as usize) <= t).collect();
            let expected: f64 = inside.iter().map(|&k| labels[k as usize]).sum();
            assert_eq!(h.count(f)[t] as usize, inside.len());
            assert_abs_diff_eq!(h.sum(f)[t], expected, epsilon = 1e-9);
        }
    }
}

proptest! {
    #[test]
    fn update_equals_direct_scan(
        (rows, labels) in arb_rows(),
        candidates in arb_candidates(),
        shift in -1.0f64..1.0,
    ) {
        let runner = TaskRunner::sequential();
        let s = samples(&rows);
        let mut h = FeatureHistogram::construct(&s, &labels, candidates, &runner).unwrap();
        let all: Vec<u32> = (0..rows.len() as u32).collect();
        assert_matches_scan(&h, &all, &labels);

        let relabeled: Vec<f64> = labels.iter().enumerate().map(|(k, l)| l * shift + k as f64 * 0.1).collect();
        h.update(&relabeled, &runner).unwrap();
        assert_matches_scan(&h, &all, &relabeled);
    }

    #[test]
    fn buckets_respect_thresholds(
        (rows, labels) in arb_rows(),
        candidates in arb_candidates(),
    ) {
        let s = samples(&rows);
        let h = FeatureHistogram::construct(&s, &labels, candidates, &TaskRunner::sequential()).unwrap();
        let layout = h.layout();
        for f in 0..h.n_features() {
            let thresholds = layout.thresholds(f);
            prop_assert_eq!(*thresholds.last().unwrap(), f32::MAX);
            for k in 0..rows.len() {
                let value = s.value(f, k);
                let t = layout.bucket(f, k);
                // Routing by raw value and by bucket agree.
                prop_assert!(value <= thresholds[t]);
                if t > 0 {
                    prop_assert!(value > thresholds[t - 1]);
                }
            }
        }
    }

    #[test]
    fn sibling_subtraction_matches_direct_child(
        (rows, labels) in arb_rows(),
        mask in prop_vec(any::<bool>(), 30),
    ) {
        let runner = TaskRunner::new(3).unwrap();
        let s = samples(&rows);
        let parent = FeatureHistogram::construct(&s, &labels, ThresholdCandidates::All, &runner).unwrap();
        let (left, right): (Vec<u32>, Vec<u32>) = (0..rows.len() as u32).partition(|&k| mask[k as usize]);

        let left_hist = FeatureHistogram::from_subset(&parent, &left, &labels, &runner).unwrap();
        let right_hist = FeatureHistogram::subtract(&parent, &left_hist, &runner).unwrap();
        assert_matches_scan(&right_hist, &right, &labels);
        prop_assert_eq!(right_hist.n_samples(), right.len());

        let right_sum: f64 = right.iter().map(|&k| labels[k as usize]).sum();
        let right_sq: f64 = right.iter().map(|&k| labels[k as usize].powi(2)).sum();
        assert_abs_diff_eq!(right_hist.sum_response(), right_sum, epsilon = 1e-9);
        assert_abs_diff_eq!(right_hist.sq_sum_response(), right_sq, epsilon = 1e-9);

        // Consuming the parent yields the same child.
        let reused = FeatureHistogram::subtract_in_place(parent.clone(), &left_hist, &runner).unwrap();
        for f in 0..reused.n_features() {
            prop_assert_eq!(reused.count(f), right_hist.count(f));
            prop_assert_eq!(reused.sum(f), right_hist.sum(f));
        }
    }

    #[test]
    fn best_split_dominates_every_feasible_split(
        (rows, labels) in arb_rows(),
        min_leaf_support in 1usize..4,
    ) {
        let runner = TaskRunner::sequential();
        let s = samples(&rows);
        let h = FeatureHistogram::construct(&s, &labels, ThresholdCandidates::All, &runner).unwrap();
        let features: Vec<usize> = (0..h.n_features()).collect();
        let best = find_best_split(&h, &features, min_leaf_support, &runner).unwrap();

        let n = h.n_samples() as u32;
        let total = h.sum_response();
        let mut feasible = Vec::new();
        for f in 0..h.n_features() {
            for (&sum_left, &count_left) in h.sum(f).iter().zip(h.count(f)) {
                let count_right = n - count_left;
                if (count_left as usize) < min_leaf_support || (count_right as usize) < min_leaf_support {
                    continue;
                }
                let sum_right = total - sum_left;
                feasible.push(sum_left * sum_left / count_left as f64 + sum_right * sum_right / count_right as f64);
            }
        }

        match best {
            None => prop_assert!(feasible.is_empty()),
            Some(best) => {
                for score in feasible {
                    prop_assert!(best.score >= score - 1e-12);
                }
            }
        }
    }
}
