//! Tensor format conversion from SafeTensors to f32

/// Convert SafeTensors tensor view to f32 Vec
///
/// Handles bf16, fp16, and fp32 formats.
pub(crate) fn tensor_to_f32_vec(tensor: &safetensors::tensor::TensorView<'_>) -> Option<Vec<f32>> {
    use safetensors::Dtype;

    let numel: usize = tensor.shape().iter().product();
    if numel == 0 {
        return Some(Vec::new());
    }

    let data = tensor.data();

    match tensor.dtype() {
        Dtype::F32 => Some(
            data.chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        ),
        Dtype::F16 => Some(
            data.chunks_exact(2)
                .map(|chunk| half::f16::from_bits(u16::from_le_bytes([chunk[0], chunk[1]])).to_f32())
                .collect(),
        ),
        Dtype::BF16 => Some(
            data.chunks_exact(2)
                .map(|chunk| half::bf16::from_bits(u16::from_le_bytes([chunk[0], chunk[1]])).to_f32())
                .collect(),
        ),
        other => {
            // Masks and step counters (bool, integer buffers) carry no weights
            tracing::warn!(dtype = ?other, "unsupported tensor dtype, skipping");
            None
        }
    }
}
