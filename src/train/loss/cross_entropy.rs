//! Cross Entropy Loss for classification

use crate::autograd::{needs_grad, BackwardOp};
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

use super::LossFn;

/// Cross Entropy Loss (for classification)
///
/// L = -sum(targets * log(softmax(predictions)))
///
/// # Example
///
/// ```
/// use atencion::train::{one_hot, CrossEntropyLoss, LossFn};
/// use atencion::Tensor;
///
/// let loss_fn = CrossEntropyLoss;
/// let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5], true);
///
/// let loss = loss_fn.forward(&logits, &one_hot(0, 3));
/// assert!(loss.data()[0] > 0.0);
/// ```
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Compute softmax: exp(x_i) / sum(exp(x_j))
    pub(crate) fn softmax(x: &Array1<f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_x: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp_x.sum();
        exp_x / sum
    }

    /// log(softmax(x)) without forming the probabilities
    fn log_softmax(x: &Array1<f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let log_sum = x.iter().map(|&v| (v - max).exp()).sum::<f32>().ln() + max;
        x.mapv(|v| v - log_sum)
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let log_probs = Self::log_softmax(&predictions.data());
        let ce: f32 = targets
            .data()
            .iter()
            .zip(log_probs.iter())
            .map(|(&t, &lp)| if t == 0.0 { 0.0 } else { -t * lp })
            .sum();

        let requires_grad = needs_grad(&[predictions]);
        let mut loss = Tensor::from_vec(vec![ce], requires_grad);

        if requires_grad {
            // d(CE)/d(logits) = probs - targets
            let grad = &Self::softmax(&predictions.data()) - &*targets.data();
            loss.set_backward_op(Rc::new(CrossEntropyBackward {
                predictions: predictions.clone(),
                grad,
                result_grad: loss.grad_cell(),
            }));
        }

        loss
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}

struct CrossEntropyBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for CrossEntropyBackward {
    fn backward(&self) {
        if let Some(upstream) = self.result_grad.borrow().as_ref() {
            if self.predictions.requires_grad() {
                self.predictions.accumulate_grad(&self.grad * upstream[0]);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.predictions.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use crate::train::{mean_loss, one_hot};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_cross_entropy_loss() {
        let loss_fn = CrossEntropyLoss;
        let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5], true);
        let loss = loss_fn.forward(&logits, &one_hot(0, 3));

        // -log(e^2 / (e^2 + e^1 + e^0.5))
        assert_relative_eq!(loss.data()[0], 0.464_369, epsilon = 1e-5);
    }

    #[test]
    fn test_softmax() {
        let x = Array1::from(vec![1.0, 2.0, 3.0]);
        let probs = CrossEntropyLoss::softmax(&x);
        assert_relative_eq!(probs.sum(), 1.0, epsilon = 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let logits = Tensor::from_vec(vec![1000.0, -1000.0], true);
        let loss = CrossEntropyLoss.forward(&logits, &one_hot(1, 2));
        assert!(loss.data()[0].is_finite());
        assert_relative_eq!(loss.data()[0], 2000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_gradient_is_probs_minus_targets() {
        let logits = Tensor::from_vec(vec![0.5, -0.5], true);
        let loss = CrossEntropyLoss.forward(&logits, &one_hot(1, 2));
        backward(&loss, None);
        let grad = logits.grad().unwrap();
        let p0 = 1.0 / (1.0 + (-1.0f32).exp());
        assert_relative_eq!(grad[0], p0, epsilon = 1e-6);
        // p1 = 1 - p0, so p1 - 1 = -p0
        assert_relative_eq!(grad[1], -p0, epsilon = 1e-6);
    }

    #[test]
    fn test_mean_loss_scales_gradient() {
        let logits = Tensor::from_vec(vec![0.5, -0.5], true);
        let a = CrossEntropyLoss.forward(&logits, &one_hot(0, 2));
        let b = CrossEntropyLoss.forward(&logits, &one_hot(0, 2));
        let mean = mean_loss(&[a.clone(), b]).unwrap();
        assert_relative_eq!(mean.data()[0], a.data()[0], epsilon = 1e-6);

        backward(&mean, None);
        let single = Tensor::from_vec(vec![0.5, -0.5], true);
        backward(&CrossEntropyLoss.forward(&single, &one_hot(0, 2)), None);
        assert_relative_eq!(logits.grad().unwrap()[0], single.grad().unwrap()[0], epsilon = 1e-6);
        assert!(mean_loss(&[]).is_none());
    }

    proptest! {
        #[test]
        fn prop_gradient_matches_finite_difference(
            logits in prop::collection::vec(-4.0f32..4.0, 2..6),
            class in 0usize..6,
        ) {
            let n = logits.len();
            let class = class % n;
            let x = Tensor::from_vec(logits.clone(), true);
            backward(&CrossEntropyLoss.forward(&x, &one_hot(class, n)), None);
            let analytical = x.grad().unwrap();

            let eps = 1e-2;
            for k in 0..n {
                let at = |delta: f32| {
                    let mut v = logits.clone();
                    v[k] += delta;
                    CrossEntropyLoss.forward(&Tensor::from_vec(v, false), &one_hot(class, n)).data()[0]
                };
                let numerical = (at(eps) - at(-eps)) / (2.0 * eps);
                prop_assert!((analytical[k] - numerical).abs() < 1e-2);
            }
        }
    }
}
