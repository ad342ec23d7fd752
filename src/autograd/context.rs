//! Gradient recording context
//!
//! Graph recording is on by default. Inference passes wrap themselves in
//! [`no_grad`] so that no backward ops are attached to their results.

use super::Tensor;
use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Whether ops currently record backward functions
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Guard that disables graph recording until dropped
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct NoGradGuard {
    previous: bool,
}

impl Drop for NoGradGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|flag| flag.set(self.previous));
    }
}

/// Disable graph recording for the lifetime of the returned guard
pub fn no_grad() -> NoGradGuard {
    let previous = GRAD_ENABLED.with(|flag| flag.replace(false));
    NoGradGuard { previous }
}

/// Whether an op over `inputs` must record a backward function
pub(crate) fn needs_grad(inputs: &[&Tensor]) -> bool {
    is_grad_enabled() && inputs.iter().any(|t| t.requires_grad())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grad_enabled_by_default() {
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_no_grad_guard_restores() {
        {
            let _guard = no_grad();
            assert!(!is_grad_enabled());
            {
                let _inner = no_grad();
                assert!(!is_grad_enabled());
            }
            assert!(!is_grad_enabled());
        }
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_needs_grad() {
        let a = Tensor::from_vec(vec![1.0], true);
        let b = Tensor::from_vec(vec![1.0], false);
        assert!(needs_grad(&[&a, &b]));
        assert!(!needs_grad(&[&b]));
        let _guard = no_grad();
        assert!(!needs_grad(&[&a]));
    }
}
