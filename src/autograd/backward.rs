//! Backward operation trait and graph traversal

use super::Tensor;
use std::collections::HashSet;
use std::rc::Rc;

/// Gradient rule of one recorded operation
///
/// `backward` reads the result gradient captured at construction time and
/// accumulates into the inputs. It must not recurse: traversal order is owned
/// by [`topological_order`].
pub trait BackwardOp {
    /// Propagate the result gradient into the inputs
    fn backward(&self);

    /// Tensors this operation consumed
    fn inputs(&self) -> Vec<Tensor>;
}

/// Ops reachable from `root`, ordered so that every op runs after all of its
/// consumers.
pub(crate) fn topological_order(root: &Tensor) -> Vec<Rc<dyn BackwardOp>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(Tensor, bool)> = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        let Some(op) = node.backward_op() else {
            continue;
        };
        if expanded {
            order.push(op);
            continue;
        }
        if !visited.insert(node.node_id()) {
            continue;
        }
        stack.push((node, true));
        for input in op.inputs() {
            if input.backward_op().is_some() && !visited.contains(&input.node_id()) {
                stack.push((input, false));
            }
        }
    }

    order.reverse();
    order
}
