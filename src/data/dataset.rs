//! Labeled examples and task splits

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One classification example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Input text
    #[serde(alias = "sentence", alias = "question")]
    pub text: String,
    /// Class index into the task's label words
    pub label: usize,
}

impl LabeledExample {
    /// Create an example
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}

/// Ordered collection of examples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDataset {
    examples: Vec<LabeledExample>,
}

impl TaskDataset {
    /// Wrap examples
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True if there are no examples
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// All examples in order
    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Example at `index`
    pub fn get(&self, index: usize) -> Option<&LabeledExample> {
        self.examples.get(index)
    }

    /// Copy with the order permuted by a seeded RNG
    ///
    /// The same seed always yields the same permutation for a given length.
    #[must_use]
    pub fn shuffled(&self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut examples = self.examples.clone();
        examples.shuffle(&mut rng);
        Self { examples }
    }

    /// Contiguous sub-range
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] if the range runs past the end.
    pub fn select(&self, range: Range<usize>) -> Result<Self> {
        self.examples
            .get(range.clone())
            .map(|slice| Self::new(slice.to_vec()))
            .ok_or_else(|| {
                Error::InsufficientData(format!(
                    "cannot select {}..{} from {} examples",
                    range.start,
                    range.end,
                    self.len()
                ))
            })
    }

    /// Examples per class, for `num_labels` classes
    ///
    /// Labels outside `0..num_labels` are not counted.
    pub fn class_counts(&self, num_labels: usize) -> Vec<usize> {
        let mut counts = vec![0; num_labels];
        for example in &self.examples {
            if let Some(count) = counts.get_mut(example.label) {
                *count += 1;
            }
        }
        counts
    }

    /// Iterate over the texts
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(|e| e.text.as_str())
    }
}

impl From<Vec<LabeledExample>> for TaskDataset {
    fn from(examples: Vec<LabeledExample>) -> Self {
        Self::new(examples)
    }
}

/// Train and held-out test split of one task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSplits {
    /// Pool for demonstrations and training samples
    pub train: TaskDataset,
    /// Held-out pool for evaluation
    pub test: TaskDataset,
}

impl TaskSplits {
    /// Both splits shuffled with the same seed
    #[must_use]
    pub fn shuffled(&self, seed: u64) -> Self {
        Self { train: self.train.shuffled(seed), test: self.test.shuffled(seed) }
    }

    /// Largest label index seen in either split
    pub fn max_label(&self) -> Option<usize> {
        self.train.examples().iter().chain(self.test.examples()).map(|e| e.label).max()
    }
}
