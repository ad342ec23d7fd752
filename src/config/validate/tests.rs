//! Unit tests for configuration validation

use super::error::ValidationError;
use super::validator::{check_paths, validate_config};
use crate::config::schema::*;
use crate::error::Error;
use std::path::PathBuf;

pub(super) fn create_valid_spec() -> ReweightingSpec {
    ReweightingSpec {
        task_name: "sst2".to_string(),
        model_name: "gpt2-xl".to_string(),
        gpu: None,
        seeds: vec![42],
        demonstration_shot: 1,
        train_num_per_class: 4,
        demonstration_total_shot: None,
        actual_sample_size: 1000,
        lr: 0.01,
        epoch_num: 10,
        n_head: None,
        batch_size: 1,
        sample_from: "test".to_string(),
        save_file_name: PathBuf::from("out.json"),
        data: DataPaths { train: PathBuf::from("train.jsonl"), test: PathBuf::from("test.jsonl") },
        model: ModelSource::default(),
        task: None,
    }
}

#[test]
fn test_valid_config() {
    let spec = create_valid_spec();
    assert!(validate_config(&spec).is_ok());
    assert!(spec.validate().is_ok());
}

#[test]
fn test_invalid_learning_rate() {
    let mut spec = create_valid_spec();
    spec.lr = 0.0;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidLearningRate(_))));

    spec.lr = f32::NAN;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidLearningRate(_))));
}

#[test]
fn test_empty_seeds() {
    let mut spec = create_valid_spec();
    spec.seeds.clear();
    assert!(matches!(validate_config(&spec), Err(ValidationError::EmptySeeds)));
    assert!(matches!(spec.validate(), Err(Error::Validation(ValidationError::EmptySeeds))));
}

#[test]
fn test_zero_counts() {
    let mut spec = create_valid_spec();
    spec.demonstration_shot = 0;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidDemonstrationShot(0))));

    let mut spec = create_valid_spec();
    spec.demonstration_total_shot = Some(0);
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidDemonstrationTotalShot(0))));

    let mut spec = create_valid_spec();
    spec.actual_sample_size = 0;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidSampleSize(0))));

    let mut spec = create_valid_spec();
    spec.n_head = Some(0);
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidHeadCount(0))));
}

#[test]
fn test_empty_save_file_name() {
    let mut spec = create_valid_spec();
    spec.save_file_name = PathBuf::new();
    assert!(matches!(validate_config(&spec), Err(ValidationError::EmptySaveFileName)));
}

#[test]
fn test_sample_from_checked_before_numbers() {
    let mut spec = create_valid_spec();
    spec.sample_from = "validation".to_string();
    spec.epoch_num = 0;
    assert!(matches!(spec.validate(), Err(Error::UnsupportedSampleSource { source_name }) if source_name == "validation"));
}

#[test]
fn test_unknown_task_without_template() {
    let mut spec = create_valid_spec();
    spec.task_name = "rte".to_string();
    assert!(matches!(spec.validate(), Err(Error::ConfigError(_))));
}

#[test]
fn test_check_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = create_valid_spec();
    assert!(matches!(check_paths(&spec), Err(ValidationError::TrainDataNotFound(_))));

    spec.data.train = dir.path().join("train.jsonl");
    spec.data.test = dir.path().join("test.jsonl");
    std::fs::write(&spec.data.train, "").unwrap();
    assert!(matches!(check_paths(&spec), Err(ValidationError::TestDataNotFound(_))));

    std::fs::write(&spec.data.test, "").unwrap();
    assert!(check_paths(&spec).is_ok());

    spec.model = ModelSource::Pretrained { path: dir.path().join("missing") };
    assert!(matches!(check_paths(&spec), Err(ValidationError::ModelPathNotFound(_))));
}

#[test]
fn test_derived_settings() {
    let mut spec = create_valid_spec();
    spec.demonstration_total_shot = Some(3);
    let plan = spec.sampling_plan();
    assert_eq!(plan.demonstration_total_shot, Some(3));
    let train = spec.train_config();
    assert_eq!((train.epochs, train.batch_size), (10, 1));
    assert_eq!(spec.family().unwrap(), crate::transformer::ModelFamily::Gpt2);
}
