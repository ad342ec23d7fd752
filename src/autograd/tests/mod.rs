//! Tests for autograd operations with gradient checking

mod graph;
mod prop_attention;
mod prop_matmul;
mod prop_normalize;
