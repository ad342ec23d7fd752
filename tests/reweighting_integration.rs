//! End-to-end reweighting runs from a YAML spec to the JSON artifact

use atencion::config::load_config;
use atencion::experiment::{run_from_spec, ResultArtifact, RunOutcome};
use atencion::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const POSITIVE: [&str; 4] = ["great", "warm", "lovely", "fun"];
const NEGATIVE: [&str; 4] = ["awful", "dull", "flat", "poor"];

/// JSONL with `per_class` examples of each of two classes, interleaved
fn jsonl(per_class: usize, key: &str) -> String {
    (0..per_class)
        .flat_map(|i| {
            [
                format!(r#"{{"{key}": "movie {i} was {}", "label": 1}}"#, POSITIVE[i % 4]),
                format!(r#"{{"{key}": "movie {i} was {}", "label": 0}}"#, NEGATIVE[i % 4]),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(train_per_class: usize, test_per_class: usize) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("train.jsonl"), jsonl(train_per_class, "text")).unwrap();
        fs::write(dir.path().join("test.jsonl"), jsonl(test_per_class, "sentence")).unwrap();
        Self { dir }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("results").join("sst2.json")
    }

    /// Write a spec; `extra` is appended verbatim
    fn spec(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("spec.yaml");
        let yaml = format!(
            "task_name: sst2\nsave_file_name: {}\ndata:\n  train: {}\n  test: {}\n{extra}",
            self.output().display(),
            self.dir.path().join("train.jsonl").display(),
            self.dir.path().join("test.jsonl").display(),
        );
        fs::write(&path, yaml).unwrap();
        path
    }
}

fn completed(outcome: RunOutcome) -> ResultArtifact {
    match outcome {
        RunOutcome::Completed { artifact, .. } => artifact,
        RunOutcome::Skipped { path } => panic!("unexpected skip of {}", path.display()),
    }
}

fn run(path: &Path) -> atencion::Result<RunOutcome> {
    run_from_spec(&load_config(path)?)
}

#[test]
fn test_single_seed_run_shapes() {
    let ws = Workspace::new(10, 6);
    let spec = ws.spec(
        "model_name: gpt2-xl\nseeds: [0]\ndemonstration_shot: 2\ntrain_num_per_class: 4\nepoch_num: 3\nactual_sample_size: 8\nlr: 0.05\n",
    );
    let artifact = completed(run(&spec).unwrap());

    assert_eq!(artifact.seeds, vec![0]);
    let record = &artifact.records[0];
    assert_eq!(record.loss_curve.len(), 3);
    assert_eq!(record.final_average_loss, record.loss_curve[2]);
    assert_eq!(record.active_predictions.len(), 8);
    assert_eq!(record.bypassed_predictions.len(), 8);
    // 2 classes x 2 shots
    assert!(record.learned_params.iter().all(|w| w.n_demo == 4 && w.values.len() == w.head_count * 4));
    assert!(record.learned_params.iter().flat_map(|w| &w.values).any(|v| *v != 0.0));
}

#[test]
fn test_every_family_runs() {
    for model_name in ["gpt2-xl", "gpt-j-6b", "meta-llama/Llama-2-7b-chat-hf"] {
        let ws = Workspace::new(6, 3);
        let spec = ws.spec(&format!(
            "model_name: {model_name}\nseeds: [1, 2]\ntrain_num_per_class: 2\nepoch_num: 1\nactual_sample_size: 4\n"
        ));
        let artifact = completed(run(&spec).unwrap());
        assert_eq!(artifact.records.len(), 2, "{model_name}");
        assert_eq!(artifact.metadata.model_name, model_name);
    }
}

#[test]
fn test_existing_artifact_is_not_overwritten() {
    let ws = Workspace::new(6, 3);
    let spec = ws.spec("model_name: gpt2-xl\nseeds: [0]\ntrain_num_per_class: 2\nepoch_num: 1\nactual_sample_size: 4\n");

    completed(run(&spec).unwrap());
    let first = fs::read_to_string(ws.output()).unwrap();

    assert!(matches!(run(&spec).unwrap(), RunOutcome::Skipped { .. }));
    assert_eq!(fs::read_to_string(ws.output()).unwrap(), first);
}

#[test]
fn test_evaluation_sample_is_clamped_to_test_pool() {
    let ws = Workspace::new(6, 100);
    let spec = ws.spec("model_name: gpt2-xl\nseeds: [0]\ntrain_num_per_class: 2\nepoch_num: 1\nactual_sample_size: 1000\n");
    let artifact = completed(run(&spec).unwrap());
    assert_eq!(artifact.records[0].active_predictions.len(), 200);
    assert_eq!(artifact.records[0].bypassed_predictions.len(), 200);
}

#[test]
fn test_artifact_json_layout() {
    let ws = Workspace::new(6, 3);
    let spec = ws.spec("model_name: gpt2-xl\nseeds: [5, 6, 7]\ntrain_num_per_class: 2\nepoch_num: 2\nactual_sample_size: 6\n");
    completed(run(&spec).unwrap());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(ws.output()).unwrap()).unwrap();
    assert_eq!(json["seeds"], serde_json::json!([5, 6, 7]));
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    for record in records {
        assert_eq!(record.as_object().unwrap().len(), 5);
        assert_eq!(record["loss_curve"].as_array().unwrap().len(), 2);
    }
}

#[test]
fn test_unsupported_inputs_fail_before_any_output() {
    let ws = Workspace::new(6, 3);
    let spec = ws.spec("model_name: gpt2-xl\nsample_from: train\n");
    assert!(matches!(load_config(&spec), Err(Error::UnsupportedSampleSource { .. })));

    let spec = ws.spec("model_name: t5-large\n");
    assert!(matches!(load_config(&spec), Err(Error::UnsupportedModel { .. })));
    assert!(!ws.output().exists());
}

#[test]
fn test_too_few_training_examples() {
    // demonstrations take the only example of each class
    let ws = Workspace::new(1, 3);
    let spec = ws.spec("model_name: gpt2-xl\nseeds: [0]\nepoch_num: 1\n");
    assert!(matches!(run(&spec), Err(Error::InsufficientData(_))));
    assert!(!ws.output().exists());
}
