//! CLI command tests

use super::*;
use crate::cli::LogLevel;
use crate::config::*;
use crate::experiment::ResultArtifact;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TRAIN: &str = r#"{"text": "a warm story", "label": 1}
{"text": "a dull mess", "label": 0}
{"text": "truly great fun", "label": 1}
{"text": "truly awful", "label": 0}
{"text": "so good", "label": 1}
{"text": "so bad", "label": 0}
"#;

const TEST: &str = r#"{"sentence": "great and warm", "label": 1}
{"sentence": "bad and flat", "label": 0}
"#;

/// Create a minimal valid spec with its data files
fn create_test_config(dir: &TempDir) -> PathBuf {
    let train = dir.path().join("train.jsonl");
    let test = dir.path().join("test.jsonl");
    std::fs::write(&train, TRAIN).unwrap();
    std::fs::write(&test, TEST).unwrap();

    let config = format!(
        r#"
task_name: sst2
model_name: gpt2-xl
seeds: [0]
demonstration_shot: 1
train_num_per_class: 2
actual_sample_size: 2
lr: 0.05
epoch_num: 2
save_file_name: {}
data:
  train: {}
  test: {}
"#,
        dir.path().join("out.json").display(),
        train.display(),
        test.display()
    );
    let path = dir.path().join("spec.yaml");
    std::fs::write(&path, config).unwrap();
    path
}

fn run_args(config: &Path) -> RunArgs {
    RunArgs { config: config.to_path_buf(), seeds: None, lr: None, epochs: None, output: None, dry_run: false }
}

fn cli(command: Command) -> Cli {
    Cli { command, verbose: false, quiet: true }
}

#[test]
fn test_validate_command() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let args = ValidateArgs { config, paths: true };
    assert!(run_command(cli(Command::Validate(args))).is_ok());
}

#[test]
fn test_validate_missing_file() {
    let args = ValidateArgs { config: PathBuf::from("/nonexistent.yaml"), paths: false };
    let err = run_command(cli(Command::Validate(args))).unwrap_err();
    assert!(err.starts_with("Config error"));
}

#[test]
fn test_info_all_formats() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let args = InfoArgs { config: config.clone(), format };
        assert!(info::run_info(args, LogLevel::Quiet).is_ok());
    }
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let args = RunArgs { dry_run: true, ..run_args(&config) };
    assert!(run_command(cli(Command::Run(args))).is_ok());
    assert!(!dir.path().join("out.json").exists());
}

#[test]
fn test_run_with_overrides() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let output = dir.path().join("results").join("override.json");
    let args = RunArgs { seeds: Some(vec![4, 5]), epochs: Some(1), output: Some(output.clone()), ..run_args(&config) };
    assert!(run_command(cli(Command::Run(args))).is_ok());

    let artifact = ResultArtifact::load(&output).unwrap();
    assert_eq!(artifact.seeds, vec![4, 5]);
    assert!(artifact.records.iter().all(|r| r.loss_curve.len() == 1));
}

#[test]
fn test_invalid_override_rejected() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let args = RunArgs { lr: Some(0.0), ..run_args(&config) };
    let err = run_command(cli(Command::Run(args))).unwrap_err();
    assert!(err.contains("learning rate"));
}

#[test]
fn test_apply_overrides() {
    let dir = TempDir::new().unwrap();
    let mut spec = load_config(create_test_config(&dir)).unwrap();
    let args = RunArgs { seeds: Some(vec![9]), lr: Some(0.2), ..run_args(Path::new("unused.yaml")) };
    apply_overrides(&mut spec, &args);
    assert_eq!(spec.seeds, vec![9]);
    assert_eq!(spec.lr, 0.2);
    assert_eq!(spec.epoch_num, 2);
}
