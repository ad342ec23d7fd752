//! Loss functions

mod cross_entropy;

pub use cross_entropy::CrossEntropyLoss;

use crate::autograd::{add, scale};
use crate::Tensor;

/// Trait for loss functions
pub trait LossFn {
    /// Compute loss given predictions and targets
    ///
    /// Returns a scalar loss value and sets up gradients for backpropagation
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &str;
}

/// Mean of scalar losses, differentiable
///
/// Returns `None` for an empty slice.
pub fn mean_loss(losses: &[Tensor]) -> Option<Tensor> {
    let (first, rest) = losses.split_first()?;
    let total = rest.iter().fold(first.clone(), |acc, loss| add(&acc, loss));
    Some(scale(&total, 1.0 / losses.len() as f32))
}

/// One-hot target vector of length `num_classes`
pub fn one_hot(class: usize, num_classes: usize) -> Tensor {
    let mut values = vec![0.0; num_classes];
    if let Some(v) = values.get_mut(class) {
        *v = 1.0;
    }
    Tensor::from_vec(values, false)
}
