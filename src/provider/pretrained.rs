//! HuggingFace checkpoint directories

use super::{LoadedModel, ModelProvider};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::tokenizer::{HfTokenizer, Tokenizer};
use crate::transformer::{load_safetensors_weights, CausalLm, ModelFamily, TransformerConfig};
use std::path::PathBuf;

/// Loads `config.json`, `*.safetensors` and `tokenizer.json` from one directory
#[derive(Debug, Clone)]
pub struct PretrainedModelProvider {
    dir: PathBuf,
}

impl PretrainedModelProvider {
    /// Provider for a checkpoint directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ModelProvider for PretrainedModelProvider {
    fn load(&self, family: ModelFamily, device: Device) -> Result<LoadedModel> {
        let config_path = self.dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::WeightLoad { path: config_path.clone(), message: e.to_string() })?;
        let json: serde_json::Value = serde_json::from_str(&raw)?;
        let config = TransformerConfig::from_hf_config(family, &json)?;

        let weights = load_safetensors_weights(&self.dir, family)?;
        let model = CausalLm::from_weights(&config, device, weights)?;
        let tokenizer = HfTokenizer::from_file(self.dir.join("tokenizer.json"))?;

        if tokenizer.vocab_size() > config.vocab_size {
            tracing::warn!(
                tokenizer = tokenizer.vocab_size(),
                model = config.vocab_size,
                "tokenizer vocabulary is larger than the embedding table"
            );
        }
        tracing::info!(%family, dir = %self.dir.display(), layers = config.num_hidden_layers, "loaded pretrained model");
        Ok(LoadedModel { model, tokenizer: Box::new(tokenizer) })
    }
}
