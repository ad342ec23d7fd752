//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::{ModelSource, ReweightingSpec};

/// Validate the numeric fields of a spec
///
/// Checks:
/// - Numeric values are in valid ranges
/// - Seed list and output path are non-empty
pub fn validate_config(spec: &ReweightingSpec) -> Result<(), ValidationError> {
    // Learning rate must be positive and reasonable
    if !(spec.lr > 0.0 && spec.lr <= 1.0) {
        return Err(ValidationError::InvalidLearningRate(spec.lr));
    }

    if spec.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(spec.batch_size));
    }

    if spec.epoch_num == 0 {
        return Err(ValidationError::InvalidEpochs(spec.epoch_num));
    }

    if spec.seeds.is_empty() {
        return Err(ValidationError::EmptySeeds);
    }

    if spec.demonstration_shot == 0 {
        return Err(ValidationError::InvalidDemonstrationShot(spec.demonstration_shot));
    }

    if let Some(total) = spec.demonstration_total_shot {
        if total == 0 {
            return Err(ValidationError::InvalidDemonstrationTotalShot(total));
        }
    }

    if spec.actual_sample_size == 0 {
        return Err(ValidationError::InvalidSampleSize(spec.actual_sample_size));
    }

    if let Some(n_head) = spec.n_head {
        if n_head == 0 {
            return Err(ValidationError::InvalidHeadCount(n_head));
        }
    }

    if spec.save_file_name.as_os_str().is_empty() {
        return Err(ValidationError::EmptySaveFileName);
    }

    Ok(())
}

/// Check that the data files and any checkpoint directory exist
pub fn check_paths(spec: &ReweightingSpec) -> Result<(), ValidationError> {
    if !spec.data.train.exists() {
        return Err(ValidationError::TrainDataNotFound(spec.data.train.display().to_string()));
    }

    if !spec.data.test.exists() {
        return Err(ValidationError::TestDataNotFound(spec.data.test.display().to_string()));
    }

    if let ModelSource::Pretrained { path } = &spec.model {
        if !path.exists() {
            return Err(ValidationError::ModelPathNotFound(path.display().to_string()));
        }
    }

    Ok(())
}
