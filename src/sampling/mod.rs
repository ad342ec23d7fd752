//! Sampling protocol
//!
//! Per seed, the training split yields a class-stratified demonstration set
//! and a disjoint, class-stratified training sample; the held-out test split
//! yields the evaluation sample. Every draw is a pure function of the seed and
//! the inputs.

use crate::data::{LabeledExample, TaskDataset, TaskSplits};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Shot counts and sizes for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    /// Demonstrations per class
    pub demonstration_shot: usize,
    /// Training examples per class
    pub train_num_per_class: usize,
    /// Optional cap on the total number of demonstrations
    pub demonstration_total_shot: Option<usize>,
    /// Requested evaluation sample size
    pub actual_sample_size: usize,
}

/// Everything drawn for one seed
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSets {
    /// Demonstration set, in draw order
    pub demonstrations: Vec<LabeledExample>,
    /// Training sample, disjoint from the demonstrations
    pub train: Vec<LabeledExample>,
    /// Evaluation sample from the test split
    pub eval: Vec<LabeledExample>,
    /// Requested evaluation size when it had to be clamped to the pool
    pub clamped_from: Option<usize>,
}

/// Draw a demonstration set and a disjoint training sample from `train`
///
/// Indices are shuffled with `seed` and walked in order. An example joins the
/// demonstrations while its class holds fewer than `demo_shot` of them and the
/// optional total cap is not reached; otherwise it joins the training sample
/// while its class holds fewer than `train_per_class`. The walk stops once
/// every class is full.
pub fn sample_two_sets_per_class(
    train: &TaskDataset,
    demo_shot: usize,
    train_per_class: usize,
    seed: u64,
    demo_total_shot: Option<usize>,
) -> (Vec<LabeledExample>, Vec<LabeledExample>) {
    let mut indices: Vec<usize> = (0..train.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut demo_counts: BTreeMap<usize, usize> = train.examples().iter().map(|e| (e.label, 0)).collect();
    let mut train_counts = demo_counts.clone();
    let demo_cap = demo_total_shot.unwrap_or(usize::MAX);

    let mut demonstrations = Vec::new();
    let mut sample = Vec::new();
    for index in indices {
        let example = &train.examples()[index];
        let demo_count = demo_counts.entry(example.label).or_insert(0);
        let train_count = train_counts.entry(example.label).or_insert(0);

        if *demo_count < demo_shot && demonstrations.len() < demo_cap {
            *demo_count += 1;
            demonstrations.push(example.clone());
        } else if *train_count < train_per_class {
            *train_count += 1;
            sample.push(example.clone());
        }

        let demos_full = demonstrations.len() >= demo_cap || demo_counts.values().all(|&c| c >= demo_shot);
        if demos_full && train_counts.values().all(|&c| c >= train_per_class) {
            break;
        }
    }

    for (label, &count) in &train_counts {
        if count < train_per_class {
            tracing::warn!(label, count, requested = train_per_class, "class has too few training examples");
        }
    }

    (demonstrations, sample)
}

/// First `size` examples of the test split shuffled with `seed`
///
/// Returns the sample and, if `size` exceeded the pool, the requested size.
pub fn sample_eval(test: &TaskDataset, size: usize, seed: u64) -> Result<(Vec<LabeledExample>, Option<usize>)> {
    let (actual, clamped_from) = if size > test.len() {
        tracing::warn!(requested = size, available = test.len(), "evaluation sample larger than test split; clamping");
        (test.len(), Some(size))
    } else {
        (size, None)
    };
    let eval = test.shuffled(seed).select(0..actual)?;
    Ok((eval.examples().to_vec(), clamped_from))
}

impl SamplingPlan {
    /// Draw all three sets for `seed`
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] if no demonstrations, no training
    /// examples or no evaluation examples could be drawn.
    pub fn sample(&self, splits: &TaskSplits, seed: u64) -> Result<SampledSets> {
        let (demonstrations, train) = sample_two_sets_per_class(
            &splits.train,
            self.demonstration_shot,
            self.train_num_per_class,
            seed,
            self.demonstration_total_shot,
        );
        if demonstrations.is_empty() {
            return Err(Error::InsufficientData(format!("seed {seed}: no demonstrations could be drawn")));
        }
        if train.is_empty() {
            return Err(Error::InsufficientData(format!("seed {seed}: training sample is empty")));
        }

        let (eval, clamped_from) = sample_eval(&splits.test, self.actual_sample_size, seed)?;
        if eval.is_empty() {
            return Err(Error::InsufficientData("test split is empty".to_string()));
        }

        tracing::debug!(
            seed,
            demonstrations = demonstrations.len(),
            train = train.len(),
            eval = eval.len(),
            "sampled sets"
        );
        Ok(SampledSets { demonstrations, train, eval, clamped_from })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool(n: usize, classes: usize) -> TaskDataset {
        TaskDataset::new((0..n).map(|i| LabeledExample::new(format!("ex{i}"), i % classes)).collect())
    }

    fn plan() -> SamplingPlan {
        SamplingPlan {
            demonstration_shot: 2,
            train_num_per_class: 4,
            demonstration_total_shot: None,
            actual_sample_size: 1000,
        }
    }

    #[test]
    fn test_per_class_counts() {
        let (demos, train) = sample_two_sets_per_class(&pool(60, 3), 2, 4, 0, None);
        assert_eq!(demos.len(), 6);
        assert_eq!(train.len(), 12);
        for class in 0..3 {
            assert_eq!(demos.iter().filter(|e| e.label == class).count(), 2);
            assert_eq!(train.iter().filter(|e| e.label == class).count(), 4);
        }
    }

    #[test]
    fn test_total_shot_caps_demonstrations() {
        let (demos, train) = sample_two_sets_per_class(&pool(60, 4), 2, 3, 5, Some(3));
        assert_eq!(demos.len(), 3);
        assert_eq!(train.len(), 12);
    }

    #[test]
    fn test_small_class_is_underfilled_not_error() {
        let mut examples = pool(20, 2).examples().to_vec();
        examples.push(LabeledExample::new("lonely", 2));
        let (demos, train) = sample_two_sets_per_class(&TaskDataset::new(examples), 1, 3, 1, None);
        assert_eq!(demos.iter().filter(|e| e.label == 2).count(), 1);
        assert_eq!(train.iter().filter(|e| e.label == 2).count(), 0);
    }

    #[test]
    fn test_eval_clamps_to_pool() {
        let (eval, clamped) = sample_eval(&pool(200, 2), 1000, 3).unwrap();
        assert_eq!(eval.len(), 200);
        assert_eq!(clamped, Some(1000));

        let (eval, clamped) = sample_eval(&pool(200, 2), 50, 3).unwrap();
        assert_eq!(eval.len(), 50);
        assert_eq!(clamped, None);
    }

    #[test]
    fn test_plan_sample_records_clamp() {
        let splits = TaskSplits { train: pool(40, 2), test: pool(200, 2) };
        let sets = plan().sample(&splits, 0).unwrap();
        assert_eq!(sets.eval.len(), 200);
        assert_eq!(sets.clamped_from, Some(1000));
    }

    #[test]
    fn test_plan_rejects_empty_pools() {
        let splits = TaskSplits { train: TaskDataset::default(), test: pool(10, 2) };
        assert!(matches!(plan().sample(&splits, 0), Err(Error::InsufficientData(_))));

        let splits = TaskSplits { train: pool(40, 2), test: TaskDataset::default() };
        assert!(matches!(plan().sample(&splits, 0), Err(Error::InsufficientData(_))));
    }

    proptest! {
        #[test]
        fn prop_sampling_is_deterministic(seed in any::<u64>()) {
            let splits = TaskSplits { train: pool(50, 2), test: pool(30, 2) };
            prop_assert_eq!(plan().sample(&splits, seed).unwrap(), plan().sample(&splits, seed).unwrap());
        }

        #[test]
        fn prop_demonstrations_disjoint_from_train(
            seed in any::<u64>(),
            n in 4usize..80,
            classes in 2usize..5,
            shot in 1usize..3,
            per_class in 0usize..6,
        ) {
            let (demos, train) = sample_two_sets_per_class(&pool(n, classes), shot, per_class, seed, None);
            for demo in &demos {
                prop_assert!(!train.contains(demo));
            }
        }
    }
}
