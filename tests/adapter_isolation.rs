//! Adapter isolation: only adapters learn and bypassing restores the frozen model

use atencion::adapter::{AdapterManager, AdapterMode};
use atencion::data::{LabelIdMap, LabeledExample, PromptFormatter, TaskDataset, TaskSpec, TaskSplits};
use atencion::eval::AblationDriver;
use atencion::provider::{ArchitectureOverride, ModelProvider, SyntheticModelProvider};
use atencion::train::{ReweightingTrainer, TrainConfig};
use atencion::transformer::ModelFamily;
use atencion::Device;

fn examples() -> Vec<LabeledExample> {
    vec![
        LabeledExample::new("a great film", 1),
        LabeledExample::new("a poor film", 0),
        LabeledExample::new("warm and fun", 1),
        LabeledExample::new("dull and flat", 0),
        LabeledExample::new("great fun", 1),
        LabeledExample::new("flat and poor", 0),
    ]
}

#[test]
fn test_training_touches_only_adapters_and_bypass_restores_baseline() {
    let task = TaskSpec::builtin("sst2").unwrap();
    let all = examples();
    let (demos, rest) = all.split_at(2);
    let splits = TaskSplits { train: TaskDataset::new(all.clone()), test: TaskDataset::default() };

    for family in ModelFamily::ALL {
        let mut loaded = SyntheticModelProvider::for_task(&task, &splits, ArchitectureOverride::default())
            .load(family, Device::Cpu)
            .unwrap();
        let labels = LabelIdMap::new(&task, &*loaded.tokenizer).unwrap();
        let prompts = PromptFormatter::new(&task, &*loaded.tokenizer, demos).unwrap().encode_all(rest).unwrap();

        let mut manager = AdapterManager::new(family.model_name(), 2, None, Device::Cpu).unwrap();
        let baseline = AblationDriver::new(&loaded.model, &manager, &labels).predict(&prompts).unwrap();
        let frozen: Vec<Vec<f32>> = loaded.model.parameters().iter().map(|p| p.to_vec()).collect();

        manager.install(&mut loaded.model).unwrap();
        let config = TrainConfig::new().with_epochs(4).with_lr(0.1);
        ReweightingTrainer::new(&loaded.model, &manager, &labels, config, 11).unwrap().train(&prompts).unwrap();

        let after: Vec<Vec<f32>> = loaded.model.parameters().iter().map(|p| p.to_vec()).collect();
        assert_eq!(after, frozen, "{family}: base weights changed");
        assert!(manager.params().unwrap().iter().any(|p| p.to_vec().iter().any(|v| *v != 0.0)));

        let result = AblationDriver::new(&loaded.model, &manager, &labels).run(&prompts).unwrap();
        assert_eq!(manager.mode(), AdapterMode::Bypassed);
        let logits = |set: &atencion::eval::PredictionSet| -> Vec<Vec<f32>> {
            set.predictions().iter().map(|p| p.label_logits.clone()).collect()
        };
        assert_eq!(logits(&result.bypassed), logits(&baseline), "{family}");
    }
}
