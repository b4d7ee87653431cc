use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{DataError, DataPoint, RankList};

/// Generate random dense feature rows.
///
/// Values are uniform in `[min, max]`.
pub fn random_dense_features(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Vec<Vec<f32>> {
    assert!(max >= min);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = max - min;
    (0..rows)
        .map(|_| (0..cols).map(|_| min + rng.gen::<f32>() * width).collect())
        .collect()
}

/// Shape of a synthetic ranking dataset.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticLists {
    pub n_lists: usize,
    pub items_per_list: usize,
    pub n_features: usize,
    /// Labels are integers in `0..=max_label`.
    pub max_label: u32,
    /// Amplitude of the uniform noise added to the hidden relevance score.
    pub noise: f32,
}

impl Default for SyntheticLists {
    fn default() -> Self {
        Self {
            n_lists: 20,
            items_per_list: 10,
            n_features: 5,
            max_label: 3,
            noise: 0.1,
        }
    }
}

/// Generate lists whose labels follow a hidden linear score of the features.
///
/// Each list gets its own query id `q{i}`. The same seed always yields the
/// same lists.
pub fn synthetic_rank_lists(shape: SyntheticLists, seed: u64) -> Result<Vec<RankList>, DataError> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let weights: Vec<f32> = (0..shape.n_features).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
    let scale: f32 = weights.iter().map(|w| w.abs()).sum::<f32>().max(f32::EPSILON);
    let levels = (shape.max_label + 1) as f32;

    (0..shape.n_lists)
        .map(|q| {
            let qid = format!("q{q}");
            let items: Vec<DataPoint> = (0..shape.items_per_list)
                .map(|_| {
                    let values: Vec<f32> = (0..shape.n_features).map(|_| rng.gen::<f32>()).collect();
                    let mut score: f32 = values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f32>() / scale;
                    if shape.noise > 0.0 {
                        score += (rng.gen::<f32>() * 2.0 - 1.0) * shape.noise;
                    }
                    // Map roughly [-1, 1] onto the label levels.
                    let label = (((score + 1.0) / 2.0) * levels).floor().clamp(0.0, shape.max_label as f32);
                    DataPoint::dense(label, qid.as_str(), values)
                })
                .collect();
            RankList::with_id(qid.as_str(), items)
        })
        .collect()
}

/// Deterministic split of whole lists into `(train, validation)`.
pub fn split_lists(lists: &[RankList], valid_fraction: f32, seed: u64) -> (Vec<RankList>, Vec<RankList>) {
    assert!((0.0..1.0).contains(&valid_fraction));
    let mut idx: Vec<usize> = (0..lists.len()).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let valid_len = ((lists.len() as f32) * valid_fraction).round() as usize;
    let (valid, train) = idx.split_at(valid_len.min(lists.len()));
    let pick = |ids: &[usize]| -> Vec<RankList> { ids.iter().map(|&i| lists[i].clone()).collect() };
    (pick(train), pick(valid))
}
