//! Dataset providers

use super::dataset::{LabeledExample, TaskDataset, TaskSplits};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Source of a task's train and test splits
pub trait DatasetProvider {
    /// Load both splits
    fn load(&self) -> Result<TaskSplits>;
}

/// Reads `train` and `test` JSON Lines files
///
/// Each non-empty line is an object with a text field (`text`, `sentence` or
/// `question`) and an integer `label`.
#[derive(Debug, Clone)]
pub struct JsonlDatasetProvider {
    train_path: PathBuf,
    test_path: PathBuf,
}

impl JsonlDatasetProvider {
    /// Create a provider for two files
    pub fn new(train_path: impl Into<PathBuf>, test_path: impl Into<PathBuf>) -> Self {
        Self { train_path: train_path.into(), test_path: test_path.into() }
    }

    /// Load examples from a single JSONL file
    fn load_jsonl_file(path: &Path) -> Result<TaskDataset> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("cannot read dataset {}: {e}", path.display())))?;

        let mut examples = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let example: LabeledExample = serde_json::from_str(line).map_err(|e| {
                Error::ConfigError(format!("{}:{}: {e}", path.display(), line_num + 1))
            })?;
            examples.push(example);
        }

        tracing::debug!(path = %path.display(), examples = examples.len(), "loaded split");
        Ok(TaskDataset::new(examples))
    }
}

impl DatasetProvider for JsonlDatasetProvider {
    fn load(&self) -> Result<TaskSplits> {
        Ok(TaskSplits {
            train: Self::load_jsonl_file(&self.train_path)?,
            test: Self::load_jsonl_file(&self.test_path)?,
        })
    }
}

/// Splits already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetProvider {
    splits: TaskSplits,
}

impl InMemoryDatasetProvider {
    /// Wrap existing splits
    pub fn new(train: Vec<LabeledExample>, test: Vec<LabeledExample>) -> Self {
        Self { splits: TaskSplits { train: train.into(), test: test.into() } }
    }
}

impl DatasetProvider for InMemoryDatasetProvider {
    fn load(&self) -> Result<TaskSplits> {
        Ok(self.splits.clone())
    }
}
