//! Frozen affine projection
//!
//! Weights are stored (in_features x out_features), row-major, so a forward
//! pass is a single `x @ W` without transposition.

use crate::autograd::{add_bias, matmul};
use crate::error::{Error, Result};
use crate::Tensor;

/// Deterministic initialization values
///
/// Xavier-scaled sinusoid; `salt` decorrelates tensors of the same size.
pub(crate) fn init_values(len: usize, fan_in: usize, fan_out: usize, salt: f32) -> Vec<f32> {
    let scale = (2.0 / (fan_in + fan_out) as f32).sqrt();
    (0..len).map(|i| (i as f32 * 0.123 + salt).sin() * scale).collect()
}

/// Linear layer `y = x @ W + b`
pub struct Linear {
    /// Weight (in_features x out_features)
    pub weight: Tensor,
    /// Optional bias (out_features)
    pub bias: Option<Tensor>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a frozen layer with deterministic weights
    pub fn new(in_features: usize, out_features: usize, with_bias: bool, salt: f32) -> Self {
        let weight = Tensor::from_vec(
            init_values(in_features * out_features, in_features, out_features, salt),
            false,
        );
        let bias = with_bias.then(|| Tensor::zeros(out_features, false));
        Self { weight, bias, in_features, out_features }
    }

    /// Wrap loaded tensors
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if a tensor length disagrees with the
    /// declared geometry.
    pub fn from_tensors(
        weight: Tensor,
        bias: Option<Tensor>,
        in_features: usize,
        out_features: usize,
    ) -> Result<Self> {
        if weight.len() != in_features * out_features {
            return Err(Error::shape("linear weight", in_features * out_features, weight.len()));
        }
        if let Some(b) = &bias {
            if b.len() != out_features {
                return Err(Error::shape("linear bias", out_features, b.len()));
            }
        }
        Ok(Self { weight, bias, in_features, out_features })
    }

    /// Forward pass over `rows` stacked inputs
    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        let y = matmul(x, &self.weight, rows, self.in_features, self.out_features);
        match &self.bias {
            Some(bias) => add_bias(&y, bias, rows, self.out_features),
            None => y,
        }
    }

    /// Input width
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Output width
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// All parameter tensors
    pub fn parameters(&self) -> Vec<Tensor> {
        std::iter::once(self.weight.clone()).chain(self.bias.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_with_bias() {
        let weight = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], false);
        let bias = Tensor::from_vec(vec![0.5, -0.5], false);
        let layer = Linear::from_tensors(weight, Some(bias), 3, 2).unwrap();
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
        assert_eq!(layer.forward(&x, 1).to_vec(), vec![4.5, 4.5]);
    }

    #[test]
    fn test_new_is_frozen_and_deterministic() {
        let a = Linear::new(4, 3, true, 0.7);
        let b = Linear::new(4, 3, true, 0.7);
        assert_eq!(a.weight.to_vec(), b.weight.to_vec());
        assert!(a.parameters().iter().all(|p| !p.requires_grad()));
        assert_eq!(a.parameters().len(), 2);
    }

    #[test]
    fn test_from_tensors_rejects_bad_length() {
        let err = Linear::from_tensors(Tensor::zeros(5, false), None, 2, 3).err().unwrap();
        assert!(matches!(err, Error::ShapeMismatch { expected: 6, actual: 5, .. }));
    }
}
