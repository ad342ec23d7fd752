//! YAML schema of a reweighting run

use crate::data::TaskSpec;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::provider::ArchitectureOverride;
use crate::sampling::SamplingPlan;
use crate::train::TrainConfig;
use crate::transformer::ModelFamily;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The only evaluation pool this crate supports
pub const SAMPLE_FROM_TEST: &str = "test";

fn default_seeds() -> Vec<u64> {
    vec![42, 43, 44, 45, 46]
}

fn default_demonstration_shot() -> usize {
    1
}

fn default_train_num_per_class() -> usize {
    4
}

fn default_actual_sample_size() -> usize {
    1000
}

fn default_lr() -> f32 {
    0.01
}

fn default_epoch_num() -> usize {
    10
}

fn default_batch_size() -> usize {
    1
}

fn default_sample_from() -> String {
    SAMPLE_FROM_TEST.to_string()
}

/// Complete specification of a multi-seed reweighting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReweightingSpec {
    /// Built-in task name, or the name of the custom `task`
    pub task_name: String,

    /// Model identifier; selects the model family
    pub model_name: String,

    /// Accelerator index (resolved by [`Device::select`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<usize>,

    /// One independent replicate per seed, in order
    #[serde(default = "default_seeds")]
    pub seeds: Vec<u64>,

    /// Demonstrations per class
    #[serde(default = "default_demonstration_shot")]
    pub demonstration_shot: usize,

    /// Training examples per class
    #[serde(default = "default_train_num_per_class")]
    pub train_num_per_class: usize,

    /// Cap on the total number of demonstrations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demonstration_total_shot: Option<usize>,

    /// Requested evaluation sample size
    #[serde(default = "default_actual_sample_size")]
    pub actual_sample_size: usize,

    /// Adam learning rate
    #[serde(default = "default_lr")]
    pub lr: f32,

    /// Training epochs per seed
    #[serde(default = "default_epoch_num")]
    pub epoch_num: usize,

    /// Adapter rows per layer (default: one per attention head)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_head: Option<usize>,

    /// Prompts per optimizer step
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Evaluation pool; must be `test`
    #[serde(default = "default_sample_from")]
    pub sample_from: String,

    /// Artifact path; an existing file skips the run
    pub save_file_name: PathBuf,

    /// Dataset split files
    pub data: DataPaths,

    /// Where the frozen model comes from
    #[serde(default)]
    pub model: ModelSource,

    /// Custom prompt template (overrides the built-in task of the same name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSpec>,
}

/// JSON Lines files of the two splits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPaths {
    /// Pool for demonstrations and training samples
    pub train: PathBuf,
    /// Held-out evaluation pool
    pub test: PathBuf,
}

/// Model provider selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ModelSource {
    /// Small deterministic model of the family, vocabulary from the task data
    Synthetic {
        #[serde(default)]
        architecture: ArchitectureOverride,
    },
    /// HuggingFace checkpoint directory
    Pretrained { path: PathBuf },
}

impl Default for ModelSource {
    fn default() -> Self {
        Self::Synthetic { architecture: ArchitectureOverride::default() }
    }
}

impl ReweightingSpec {
    /// Model family named by `model_name`
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedModel`] for an unknown name.
    pub fn family(&self) -> Result<ModelFamily> {
        ModelFamily::from_model_name(&self.model_name)
    }

    /// Prompt template of the task
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for an unknown built-in task.
    pub fn task_spec(&self) -> Result<TaskSpec> {
        match &self.task {
            Some(task) => Ok(task.clone()),
            None => TaskSpec::builtin(&self.task_name),
        }
    }

    /// Compute device
    pub fn device(&self) -> Device {
        Device::select(self.gpu)
    }

    /// Sampling shot counts
    pub fn sampling_plan(&self) -> SamplingPlan {
        SamplingPlan {
            demonstration_shot: self.demonstration_shot,
            train_num_per_class: self.train_num_per_class,
            demonstration_total_shot: self.demonstration_total_shot,
            actual_sample_size: self.actual_sample_size,
        }
    }

    /// Training hyperparameters
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig::new().with_epochs(self.epoch_num).with_batch_size(self.batch_size).with_lr(self.lr)
    }

    /// Full pre-flight check, before any data or model is loaded
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedSampleSource`], [`Error::UnsupportedModel`],
    /// [`Error::Validation`] or a task [`Error::ConfigError`].
    pub fn validate(&self) -> Result<()> {
        if self.sample_from != SAMPLE_FROM_TEST {
            return Err(Error::UnsupportedSampleSource { source_name: self.sample_from.clone() });
        }
        self.family()?;
        super::validate_config(self)?;
        self.task_spec()?.validate()
    }
}
