//! Deterministic in-process models for offline runs

use super::{ArchitectureOverride, LoadedModel, ModelProvider};
use crate::data::{TaskSpec, TaskSplits};
use crate::device::Device;
use crate::error::Result;
use crate::tokenizer::{Tokenizer, WordTokenizer};
use crate::transformer::{CausalLm, ModelFamily, TransformerConfig};

/// Builds a small model of the requested family with deterministic weights
///
/// The tokenizer is a [`WordTokenizer`] trained on the provider's corpus and
/// the model vocabulary matches it exactly.
#[derive(Debug, Clone, Default)]
pub struct SyntheticModelProvider {
    corpus: Vec<String>,
    architecture: ArchitectureOverride,
}

impl SyntheticModelProvider {
    /// Provider over an explicit corpus
    pub fn new(corpus: Vec<String>, architecture: ArchitectureOverride) -> Self {
        Self { corpus, architecture }
    }

    /// Provider whose vocabulary covers every prompt the task can render
    pub fn for_task(task: &TaskSpec, splits: &TaskSplits, architecture: ArchitectureOverride) -> Self {
        let queries = splits.train.texts().chain(splits.test.texts()).map(|text| task.query(text));
        let labels = task.label_words.iter().map(|word| format!("{}{word}{}", task.label_prefix, task.separator));
        Self::new(queries.chain(labels).collect(), architecture)
    }
}

impl ModelProvider for SyntheticModelProvider {
    fn load(&self, family: ModelFamily, device: Device) -> Result<LoadedModel> {
        let corpus: Vec<&str> = self.corpus.iter().map(String::as_str).collect();
        let tokenizer = WordTokenizer::from_corpus(&corpus);
        let config = self.architecture.apply(TransformerConfig::tiny(family, tokenizer.vocab_size()));
        config.validate()?;

        let model = CausalLm::new(&config, device)?;
        tracing::info!(
            %family,
            vocab_size = config.vocab_size,
            layers = config.num_hidden_layers,
            heads = config.num_attention_heads,
            "built synthetic model"
        );
        Ok(LoadedModel { model, tokenizer: Box::new(tokenizer) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LabeledExample;

    fn splits() -> TaskSplits {
        TaskSplits {
            train: vec![LabeledExample::new("a fine film", 1), LabeledExample::new("a poor plot", 0)].into(),
            test: vec![LabeledExample::new("an odd ending", 0)].into(),
        }
    }

    #[test]
    fn test_vocab_matches_tokenizer() {
        let task = TaskSpec::builtin("sst2").unwrap();
        let provider = SyntheticModelProvider::for_task(&task, &splits(), ArchitectureOverride::default());
        let loaded = provider.load(ModelFamily::GptJ, Device::Cpu).unwrap();
        assert_eq!(loaded.model.config().vocab_size, loaded.tokenizer.vocab_size());
        assert_eq!(loaded.model.family(), ModelFamily::GptJ);
        assert!(loaded.tokenizer.token_to_id(" Positive").is_some());
        assert!(loaded.tokenizer.token_to_id(" ending").is_some());
    }

    #[test]
    fn test_override_is_applied() {
        let task = TaskSpec::builtin("sst2").unwrap();
        let overrides = ArchitectureOverride { num_hidden_layers: Some(3), ..Default::default() };
        let loaded = SyntheticModelProvider::for_task(&task, &splits(), overrides)
            .load(ModelFamily::Llama, Device::Cpu)
            .unwrap();
        assert_eq!(loaded.model.num_layers(), 3);
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let overrides = ArchitectureOverride { num_attention_heads: Some(5), ..Default::default() };
        let result = SyntheticModelProvider::new(vec!["x".into()], overrides).load(ModelFamily::Gpt2, Device::Cpu);
        assert!(matches!(result, Err(crate::Error::ConfigError(_))));
    }

    #[test]
    fn test_weights_are_deterministic() {
        let provider = SyntheticModelProvider::new(vec!["a b c d".into()], ArchitectureOverride::default());
        let ctx = crate::transformer::AttentionContext::new(vec![], 3);
        let a = provider.load(ModelFamily::Gpt2, Device::Cpu).unwrap().model.forward(&[1, 2, 3], &ctx).unwrap();
        let b = provider.load(ModelFamily::Gpt2, Device::Cpu).unwrap().model.forward(&[1, 2, 3], &ctx).unwrap();
        assert_eq!(a.to_vec(), b.to_vec());
    }
}
