//! Checkpoint name mapping per family
//!
//! Canonical names:
//! - `embed_tokens`, `embed_positions`
//! - `layers.{i}.input_norm.{weight,bias}`
//! - `layers.{i}.post_attention_norm.{weight,bias}`
//! - `layers.{i}.attn.{q,k,v,o}_proj.{weight,bias}`
//! - `layers.{i}.mlp.{fc_in,fc_out,gate_proj,up_proj,down_proj}.{weight,bias}`
//! - `final_norm.{weight,bias}`
//! - `lm_head.{weight,bias}`

use super::WeightMap;
use crate::error::{Error, Result};
use crate::transformer::ModelFamily;
use crate::Tensor;

/// Canonical name of a checkpoint tensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MappedName {
    pub name: String,
    /// Stored (out x in); must be transposed to (in x out)
    pub transpose: bool,
}

fn strip_root(name: &str) -> &str {
    name.strip_prefix("transformer.").or_else(|| name.strip_prefix("model.")).unwrap_or(name)
}

/// Split `h.3.attn.q_proj.weight` into `(3, "attn.q_proj.weight")`
fn split_layer<'a>(name: &'a str, marker: &str) -> Option<(usize, &'a str)> {
    let rest = name.strip_prefix(marker)?;
    let (index, tail) = rest.split_once('.')?;
    Some((index.parse().ok()?, tail))
}

/// Map a checkpoint name to its canonical name
///
/// Returns `None` for tensors the model does not use (attention mask buffers,
/// cached rotary frequencies, a GPT-2 head tied to the embedding).
pub(crate) fn map_weight_name(name: &str, family: ModelFamily) -> Option<MappedName> {
    let keep = |name: String| Some(MappedName { name, transpose: family != ModelFamily::Gpt2 });
    let keep_as_is = |name: &str| Some(MappedName { name: name.to_string(), transpose: false });

    if name.starts_with("lm_head.") {
        return if family == ModelFamily::Gpt2 { None } else { keep(name.to_string()) };
    }

    let name = strip_root(name);
    match (family, name) {
        (ModelFamily::Gpt2 | ModelFamily::GptJ, "wte.weight") | (ModelFamily::Llama, "embed_tokens.weight") => {
            return keep_as_is("embed_tokens");
        }
        (ModelFamily::Gpt2, "wpe.weight") => return keep_as_is("embed_positions"),
        _ => {}
    }
    if let Some(param) = name.strip_prefix("ln_f.").or_else(|| name.strip_prefix("norm.")) {
        return keep_as_is(&format!("final_norm.{param}"));
    }

    let marker = if family == ModelFamily::Llama { "layers." } else { "h." };
    let (layer, tail) = split_layer(name, marker)?;
    let (module, param) = tail.rsplit_once('.')?;
    if param != "weight" && param != "bias" {
        return None;
    }

    let canonical = match (family, module) {
        (ModelFamily::Gpt2 | ModelFamily::GptJ, "ln_1") | (ModelFamily::Llama, "input_layernorm") => {
            return keep_as_is(&format!("layers.{layer}.input_norm.{param}"));
        }
        (ModelFamily::Gpt2, "ln_2") | (ModelFamily::Llama, "post_attention_layernorm") => {
            return keep_as_is(&format!("layers.{layer}.post_attention_norm.{param}"));
        }
        (ModelFamily::Gpt2, "attn.c_attn") => "attn.c_attn",
        (ModelFamily::Gpt2, "attn.c_proj") => "attn.o_proj",
        (ModelFamily::Gpt2, "mlp.c_fc") => "mlp.fc_in",
        (ModelFamily::Gpt2, "mlp.c_proj") => "mlp.fc_out",
        (ModelFamily::GptJ, "attn.q_proj") => "attn.q_proj",
        (ModelFamily::GptJ, "attn.k_proj") => "attn.k_proj",
        (ModelFamily::GptJ, "attn.v_proj") => "attn.v_proj",
        (ModelFamily::GptJ, "attn.out_proj") => "attn.o_proj",
        (ModelFamily::GptJ, "mlp.fc_in") => "mlp.fc_in",
        (ModelFamily::GptJ, "mlp.fc_out") => "mlp.fc_out",
        (ModelFamily::Llama, "self_attn.q_proj") => "attn.q_proj",
        (ModelFamily::Llama, "self_attn.k_proj") => "attn.k_proj",
        (ModelFamily::Llama, "self_attn.v_proj") => "attn.v_proj",
        (ModelFamily::Llama, "self_attn.o_proj") => "attn.o_proj",
        (ModelFamily::Llama, "mlp.gate_proj") => "mlp.gate_proj",
        (ModelFamily::Llama, "mlp.up_proj") => "mlp.up_proj",
        (ModelFamily::Llama, "mlp.down_proj") => "mlp.down_proj",
        _ => return None,
    };
    keep(format!("layers.{layer}.{canonical}.{param}"))
}

/// Split every GPT-2 `attn.c_attn` (hidden x 3*hidden) into q/k/v projections
pub(crate) fn split_fused_qkv(weights: &mut WeightMap) -> Result<()> {
    let prefixes: Vec<String> = weights
        .names()
        .iter()
        .filter_map(|n| n.strip_suffix(".c_attn.weight"))
        .map(str::to_string)
        .collect();

    for prefix in prefixes {
        let fused_name = format!("{prefix}.c_attn.weight");
        let Some(fused) = weights.remove(&fused_name) else { continue };
        let len = fused.len();
        let hidden = ((len / 3) as f64).sqrt().round() as usize;
        if 3 * hidden * hidden != len {
            return Err(Error::ConfigError(format!("'{fused_name}' is not (hidden x 3*hidden): {len} values")));
        }

        let data = fused.to_vec();
        let width = 3 * hidden;
        for (part, proj) in ["q_proj", "k_proj", "v_proj"].iter().enumerate() {
            let values: Vec<f32> = (0..hidden)
                .flat_map(|r| {
                    let start = r * width + part * hidden;
                    data[start..start + hidden].iter().copied()
                })
                .collect();
            weights.insert(format!("{prefix}.{proj}.weight"), Tensor::from_vec(values, false));
        }

        if let Some(bias) = weights.remove(&format!("{prefix}.c_attn.bias")) {
            if bias.len() != width {
                return Err(Error::shape(format!("{prefix}.c_attn.bias"), width, bias.len()));
            }
            let bias = bias.to_vec();
            for (part, proj) in ["q_proj", "k_proj", "v_proj"].iter().enumerate() {
                let values = bias[part * hidden..(part + 1) * hidden].to_vec();
                weights.insert(format!("{prefix}.{proj}.bias"), Tensor::from_vec(values, false));
            }
        }
    }
    Ok(())
}
