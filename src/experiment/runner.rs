//! Multi-seed experiment runner

use super::artifact::{ArtifactMetadata, ResultArtifact};
use super::record::RunRecord;
use crate::adapter::AdapterManager;
use crate::config::{check_paths, ModelSource, ReweightingSpec};
use crate::data::{DatasetProvider, JsonlDatasetProvider, LabelIdMap, PromptFormatter, TaskSpec, TaskSplits};
use crate::error::{Error, Result};
use crate::eval::AblationDriver;
use crate::provider::{LoadedModel, ModelProvider, PretrainedModelProvider, SyntheticModelProvider};
use crate::train::ReweightingTrainer;
use std::fmt;
use std::path::PathBuf;

/// What [`run_from_spec`] did
#[derive(Debug)]
pub enum RunOutcome {
    /// Every seed ran and the artifact was written
    Completed { path: PathBuf, artifact: ResultArtifact },
    /// An artifact already existed; nothing was loaded or computed
    Skipped { path: PathBuf },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { path, artifact } => {
                let (active, bypassed) = artifact.mean_accuracy();
                write!(
                    f,
                    "Completed {} seed(s) -> {}\n  active accuracy:   {active:.4}\n  bypassed accuracy: {bypassed:.4}",
                    artifact.records.len(),
                    path.display()
                )
            }
            Self::Skipped { path } => write!(f, "Skipped: {} already exists", path.display()),
        }
    }
}

/// Run every seed of `spec` and save the artifact
///
/// Returns [`RunOutcome::Skipped`] before any loading if `save_file_name`
/// exists. The first error aborts all remaining seeds and nothing is written.
///
/// # Errors
/// Any configuration, data, model, training or IO error.
pub fn run_from_spec(spec: &ReweightingSpec) -> Result<RunOutcome> {
    if spec.save_file_name.exists() {
        tracing::info!(path = %spec.save_file_name.display(), "result artifact exists, skipping");
        return Ok(RunOutcome::Skipped { path: spec.save_file_name.clone() });
    }

    spec.validate()?;
    check_paths(spec)?;

    let task = spec.task_spec()?;
    let splits = JsonlDatasetProvider::new(&spec.data.train, &spec.data.test).load()?;
    if let Some(max) = splits.max_label().filter(|&max| max >= task.num_labels()) {
        return Err(Error::ConfigError(format!(
            "dataset label {max} out of range for task '{}' with {} label words",
            task.name,
            task.num_labels()
        )));
    }

    let loaded = load_model(spec, &task, &splits)?;
    let artifact = run_seeds(spec, &task, &splits, loaded)?;
    artifact.save(&spec.save_file_name)?;

    Ok(RunOutcome::Completed { path: spec.save_file_name.clone(), artifact })
}

fn load_model(spec: &ReweightingSpec, task: &TaskSpec, splits: &TaskSplits) -> Result<LoadedModel> {
    let family = spec.family()?;
    let device = spec.device();
    match &spec.model {
        ModelSource::Synthetic { architecture } => {
            SyntheticModelProvider::for_task(task, splits, architecture.clone()).load(family, device)
        }
        ModelSource::Pretrained { path } => PretrainedModelProvider::new(path).load(family, device),
    }
}

/// Seed loop over an already loaded model and dataset
///
/// Each seed gets a fresh [`AdapterManager`] whose installation replaces the
/// previous seed's adapters, so seeds never share trained weights.
///
/// # Errors
/// The first error of any seed.
pub fn run_seeds(
    spec: &ReweightingSpec,
    task: &TaskSpec,
    splits: &TaskSplits,
    loaded: LoadedModel,
) -> Result<ResultArtifact> {
    let LoadedModel { mut model, tokenizer } = loaded;
    let label_ids = LabelIdMap::new(task, &*tokenizer)?;
    let plan = spec.sampling_plan();
    let mut records = Vec::with_capacity(spec.seeds.len());

    for &seed in &spec.seeds {
        let span = tracing::info_span!("seed", seed);
        let _enter = span.enter();

        let sets = plan.sample(splits, seed)?;
        tracing::info!(
            demonstrations = sets.demonstrations.len(),
            train = sets.train.len(),
            eval = sets.eval.len(),
            "sampled"
        );

        let formatter = PromptFormatter::new(task, &*tokenizer, &sets.demonstrations)?;
        let train_prompts = formatter.encode_all(&sets.train)?;
        let eval_prompts = formatter.encode_all(&sets.eval)?;

        let mut manager = AdapterManager::new(&spec.model_name, formatter.n_demo(), spec.n_head, model.device())?;
        manager.install(&mut model)?;

        let result = ReweightingTrainer::new(&model, &manager, &label_ids, spec.train_config(), seed)?
            .train(&train_prompts)?;
        let ablation = AblationDriver::new(&model, &manager, &label_ids).run(&eval_prompts)?;

        let final_average_loss = result.final_loss().unwrap_or(f32::NAN);
        records.push(RunRecord {
            active_predictions: ablation.active,
            loss_curve: result.loss_curve,
            learned_params: manager.snapshot(),
            bypassed_predictions: ablation.bypassed,
            final_average_loss,
        });
    }

    ResultArtifact::new(spec.seeds.clone(), records, ArtifactMetadata::new(&spec.task_name, &spec.model_name))
}
