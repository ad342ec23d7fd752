//! Weight loading module for transformer models
//!
//! Loads SafeTensors checkpoints and renames every tensor to the canonical
//! names expected by [`CausalLm::from_weights`](super::CausalLm::from_weights).
//! Matrices are stored (in_features x out_features); checkpoints that store
//! `nn.Linear` weights as (out x in) are transposed on load.
//!
//! Supports:
//! - GPT-2 (Conv1D weights, fused `c_attn`)
//! - GPT-J
//! - LLaMA / LLaMA-2

mod convert;
mod detect;
mod mapping;


#[cfg(test)]
pub(crate) mod fixtures;

use super::family::ModelFamily;
use super::linear::Linear;
use crate::autograd::transpose;
use crate::error::{Error, Result};
use crate::Tensor;
use std::collections::HashMap;
use std::path::Path;

pub(crate) use convert::tensor_to_f32_vec;
pub(crate) use detect::{detect_family, find_safetensors_files};
pub(crate) use mapping::{map_weight_name, split_fused_qkv, MappedName};

/// Named, frozen tensors awaiting assembly into a model
#[derive(Default)]
pub struct WeightMap {
    tensors: HashMap<String, Tensor>,
}

impl WeightMap {
    /// Insert (or replace) a tensor
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Number of tensors left
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether every tensor has been taken
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Sorted tensor names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Remove a tensor without checking its length
    pub(crate) fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.tensors.remove(name)
    }

    /// Remove `name`, checking it holds `len` values
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if missing and [`Error::ShapeMismatch`]
    /// on a length mismatch.
    pub fn take(&mut self, name: &str, len: usize) -> Result<Tensor> {
        let tensor = self
            .tensors
            .remove(name)
            .ok_or_else(|| Error::ConfigError(format!("missing weight '{name}'")))?;
        if tensor.len() != len {
            return Err(Error::shape(name, len, tensor.len()));
        }
        Ok(tensor)
    }

    /// Remove `{prefix}.weight` (and `{prefix}.bias` when `bias`) as a [`Linear`]
    pub fn take_linear(&mut self, prefix: &str, in_features: usize, out_features: usize, bias: bool) -> Result<Linear> {
        let weight = self.take(&format!("{prefix}.weight"), in_features * out_features)?;
        let bias = if bias { Some(self.take(&format!("{prefix}.bias"), out_features)?) } else { None };
        Linear::from_tensors(weight, bias, in_features, out_features)
    }
}

/// Load transformer weights from SafeTensors file(s)
///
/// # Arguments
///
/// * `model_path` - Path to model directory or single SafeTensors file
/// * `family` - Architecture whose naming convention the checkpoint follows
///
/// # Errors
///
/// Returns [`Error::WeightLoad`] if no file is found or a file cannot be
/// parsed.
pub fn load_safetensors_weights(model_path: &Path, family: ModelFamily) -> Result<WeightMap> {
    use safetensors::SafeTensors;

    let st_files = find_safetensors_files(model_path)?;
    if st_files.is_empty() {
        return Err(Error::WeightLoad {
            path: model_path.to_path_buf(),
            message: "no SafeTensors files found".into(),
        });
    }

    let mut weights = WeightMap::default();

    for st_path in &st_files {
        let load_err = |message: String| Error::WeightLoad { path: st_path.clone(), message };
        let data = std::fs::read(st_path).map_err(|e| load_err(e.to_string()))?;
        let tensors = SafeTensors::deserialize(&data).map_err(|e| load_err(e.to_string()))?;

        if let Some(detected) = detect_family(&tensors) {
            if detected != family {
                tracing::warn!(%detected, expected = %family, file = %st_path.display(), "tensor names suggest a different family");
            }
        }

        for name in tensors.names() {
            let Some(MappedName { name: mapped, transpose: needs_transpose }) = map_weight_name(name, family) else {
                continue;
            };
            let view = tensors.tensor(name).map_err(|e| load_err(e.to_string()))?;
            let Some(mut values) = tensor_to_f32_vec(&view) else {
                continue;
            };
            let shape = view.shape();
            if needs_transpose && shape.len() == 2 {
                values = transpose(&values, shape[0], shape[1]);
            }
            weights.insert(mapped, Tensor::from_vec(values, false));
        }
    }

    if family == ModelFamily::Gpt2 {
        split_fused_qkv(&mut weights)?;
    }

    tracing::info!(tensors = weights.len(), files = st_files.len(), "loaded weights");
    Ok(weights)
}
