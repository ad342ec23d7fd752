//! Ablation driver tests

use super::*;
use crate::adapter::{AdapterManager, AdapterMode};
use crate::autograd::is_grad_enabled;
use crate::data::{EncodedPrompt, LabelIdMap, LabeledExample, PromptFormatter, TaskDataset, TaskSpec, TaskSplits};
use crate::device::Device;
use crate::error::Error;
use crate::provider::{ArchitectureOverride, LoadedModel, ModelProvider, SyntheticModelProvider};
use crate::transformer::ModelFamily;

fn setup(family: ModelFamily) -> (LoadedModel, LabelIdMap, Vec<EncodedPrompt>) {
    let task = TaskSpec::builtin("sst2").unwrap();
    let demos = vec![LabeledExample::new("so good", 1), LabeledExample::new("so bad", 0)];
    let eval = vec![
        LabeledExample::new("good fun", 1),
        LabeledExample::new("bad idea", 0),
        LabeledExample::new("fun but bad", 0),
    ];
    let splits = TaskSplits { train: demos.clone().into(), test: TaskDataset::new(eval.clone()) };
    let loaded = SyntheticModelProvider::for_task(&task, &splits, ArchitectureOverride::default())
        .load(family, Device::Cpu)
        .unwrap();
    let labels = LabelIdMap::new(&task, &*loaded.tokenizer).unwrap();
    let prompts = PromptFormatter::new(&task, &*loaded.tokenizer, &demos).unwrap().encode_all(&eval).unwrap();
    (loaded, labels, prompts)
}

fn logits(set: &PredictionSet) -> Vec<Vec<f32>> {
    set.predictions().iter().map(|p| p.label_logits.clone()).collect()
}

#[test]
fn test_bypassed_pass_matches_unadapted_model() {
    for family in ModelFamily::ALL {
        let (mut loaded, labels, prompts) = setup(family);
        let mut baseline_manager = AdapterManager::new(family.model_name(), 2, None, Device::Cpu).unwrap();
        let baseline = {
            let driver = AblationDriver::new(&loaded.model, &baseline_manager, &labels);
            driver.predict(&prompts).unwrap()
        };

        baseline_manager.install(&mut loaded.model).unwrap();
        for (i, param) in baseline_manager.params().unwrap().iter().enumerate() {
            param.data_mut().fill(0.3 * (i as f32 + 1.0));
        }
        let result = AblationDriver::new(&loaded.model, &baseline_manager, &labels).run(&prompts).unwrap();

        assert_eq!(logits(&result.bypassed), logits(&baseline), "{family}");
        assert_ne!(logits(&result.active), logits(&baseline), "{family}");
        assert_eq!(result.active.len(), result.bypassed.len());
    }
}

#[test]
fn test_zero_adapters_give_identical_passes() {
    let (mut loaded, labels, prompts) = setup(ModelFamily::Gpt2);
    let mut manager = AdapterManager::new("gpt2-xl", 2, None, Device::Cpu).unwrap();
    manager.install(&mut loaded.model).unwrap();
    let result = AblationDriver::new(&loaded.model, &manager, &labels).run(&prompts).unwrap();
    assert_eq!(result.active, result.bypassed);
}

#[test]
fn test_run_leaves_manager_bypassed_and_records_no_graph() {
    let (mut loaded, labels, prompts) = setup(ModelFamily::Llama);
    let mut manager = AdapterManager::new("meta-llama/Llama-2-7b-chat-hf", 2, None, Device::Cpu).unwrap();
    manager.install(&mut loaded.model).unwrap();
    AblationDriver::new(&loaded.model, &manager, &labels).run(&prompts).unwrap();

    assert_eq!(manager.mode(), AdapterMode::Bypassed);
    assert!(is_grad_enabled());
    assert!(manager.params().unwrap().iter().all(|p| p.grad().is_none()));
}

#[test]
fn test_run_without_install_fails_on_mode_switch() {
    let (loaded, labels, prompts) = setup(ModelFamily::Gpt2);
    let manager = AdapterManager::new("gpt2-xl", 2, None, Device::Cpu).unwrap();
    let err = AblationDriver::new(&loaded.model, &manager, &labels).run(&prompts).unwrap_err();
    assert!(matches!(err, Error::AdaptersNotInstalled));
}

#[test]
fn test_predictions_carry_gold_labels() {
    let (loaded, labels, prompts) = setup(ModelFamily::GptJ);
    let manager = AdapterManager::new("gpt-j-6b", 2, None, Device::Cpu).unwrap();
    let set = AblationDriver::new(&loaded.model, &manager, &labels).predict(&prompts).unwrap();
    let gold: Vec<usize> = set.predictions().iter().map(|p| p.label).collect();
    assert_eq!(gold, vec![1, 0, 0]);
    assert!(set.predictions().iter().all(|p| p.label_logits.len() == 2 && p.predicted < 2));
}
