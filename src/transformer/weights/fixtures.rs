//! SafeTensors checkpoints for tests

use crate::transformer::{ModelFamily, TransformerConfig};
use safetensors::serialize;
use safetensors::tensor::{Dtype, TensorView};
use std::collections::HashMap;
use std::path::Path;

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Write `tensors` (name, shape, values) as f32 SafeTensors
pub(crate) fn write_safetensors(path: &Path, tensors: &[(String, Vec<usize>, Vec<f32>)]) {
    let bytes: Vec<Vec<u8>> = tensors.iter().map(|(_, _, v)| f32_bytes(v)).collect();
    let views: Vec<(String, TensorView<'_>)> = tensors
        .iter()
        .zip(&bytes)
        .map(|((name, shape, _), b)| (name.clone(), TensorView::new(Dtype::F32, shape.clone(), b).unwrap()))
        .collect();
    let serialized = serialize(views, &None::<HashMap<String, String>>).unwrap();
    std::fs::write(path, serialized).unwrap();
}

fn values(len: usize, salt: f32) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.37 + salt).sin() * 0.1).collect()
}

/// A complete GPT-2 checkpoint for `TransformerConfig::tiny(Gpt2, vocab)`
pub(crate) fn tiny_gpt2_checkpoint(vocab: usize) -> Vec<(String, Vec<usize>, Vec<f32>)> {
    let config = TransformerConfig::tiny(ModelFamily::Gpt2, vocab);
    let h = config.hidden_size;
    let inter = config.intermediate_size;
    let mut tensors = vec![
        ("wte.weight".to_string(), vec![vocab, h], values(vocab * h, 0.1)),
        ("wpe.weight".to_string(), vec![config.max_position_embeddings, h], values(config.max_position_embeddings * h, 0.2)),
        ("ln_f.weight".to_string(), vec![h], vec![1.0; h]),
        ("ln_f.bias".to_string(), vec![h], vec![0.0; h]),
    ];
    for i in 0..config.num_hidden_layers {
        let p = format!("h.{i}");
        tensors.extend([
            (format!("{p}.ln_1.weight"), vec![h], vec![1.0; h]),
            (format!("{p}.ln_1.bias"), vec![h], vec![0.0; h]),
            (format!("{p}.ln_2.weight"), vec![h], vec![1.0; h]),
            (format!("{p}.ln_2.bias"), vec![h], vec![0.0; h]),
            (format!("{p}.attn.c_attn.weight"), vec![h, 3 * h], values(3 * h * h, 0.3)),
            (format!("{p}.attn.c_attn.bias"), vec![3 * h], values(3 * h, 0.4)),
            (format!("{p}.attn.c_proj.weight"), vec![h, h], values(h * h, 0.5)),
            (format!("{p}.attn.c_proj.bias"), vec![h], vec![0.0; h]),
            (format!("{p}.attn.bias"), vec![1, 1], vec![1.0]),
            (format!("{p}.mlp.c_fc.weight"), vec![h, inter], values(h * inter, 0.6)),
            (format!("{p}.mlp.c_fc.bias"), vec![inter], vec![0.0; inter]),
            (format!("{p}.mlp.c_proj.weight"), vec![inter, h], values(inter * h, 0.7)),
            (format!("{p}.mlp.c_proj.bias"), vec![h], vec![0.0; h]),
        ]);
    }
    tensors
}
