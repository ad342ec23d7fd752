//! Family detection and SafeTensors file discovery

use crate::error::{Error, Result};
use crate::transformer::ModelFamily;
use std::path::{Path, PathBuf};

/// Find SafeTensors files in a directory or return single file
pub(crate) fn find_safetensors_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension().is_some_and(|e| e == "safetensors") {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        let single = path.join("model.safetensors");
        if single.exists() {
            files.push(single);
        } else {
            // Sharded: model-00001-of-00002.safetensors
            let entries = std::fs::read_dir(path).map_err(|e| Error::WeightLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.extension().is_some_and(|e| e == "safetensors") {
                    files.push(p);
                }
            }
            files.sort();
        }
    }

    Ok(files)
}

/// Guess the family from characteristic tensor names
pub(crate) fn detect_family(tensors: &safetensors::SafeTensors<'_>) -> Option<ModelFamily> {
    let names = tensors.names();
    if names.iter().any(|n| n.contains("attn.c_attn.")) {
        Some(ModelFamily::Gpt2)
    } else if names.iter().any(|n| n.contains("attn.out_proj.") || n.contains("mlp.fc_in.")) {
        Some(ModelFamily::GptJ)
    } else if names.iter().any(|n| n.contains("self_attn.") || n.contains("input_layernorm.")) {
        Some(ModelFamily::Llama)
    } else {
        None
    }
}
