//! Embedding layer module
//!
//! Token and learned-position lookup tables.

use super::linear::init_values;
use super::weights::WeightMap;
use crate::autograd::gather_rows;
use crate::error::{Error, Result};
use crate::Tensor;

/// Lookup table (num_embeddings x hidden_size)
pub struct Embedding {
    /// Embedding weight (num_embeddings x hidden_size)
    pub weight: Tensor,
    num_embeddings: usize,
    hidden_size: usize,
}

impl Embedding {
    /// Create a frozen table with deterministic values
    pub fn new(num_embeddings: usize, hidden_size: usize, salt: f32) -> Self {
        let values = init_values(num_embeddings * hidden_size, hidden_size, hidden_size, salt);
        Self { weight: Tensor::from_vec(values, false), num_embeddings, hidden_size }
    }

    /// Take the table named `name` out of a weight map
    pub fn from_weights(
        weights: &mut WeightMap,
        name: &str,
        num_embeddings: usize,
        hidden_size: usize,
    ) -> Result<Self> {
        let weight = weights.take(name, num_embeddings * hidden_size)?;
        Ok(Self { weight, num_embeddings, hidden_size })
    }

    /// Look up rows for the given ids
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] for an id outside the table.
    pub fn forward(&self, ids: &[u32]) -> Result<Tensor> {
        let rows = ids
            .iter()
            .map(|&id| {
                let row = id as usize;
                if row < self.num_embeddings {
                    Ok(row)
                } else {
                    Err(Error::shape("embedding lookup", self.num_embeddings, row))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(gather_rows(&self.weight, &rows, self.hidden_size))
    }

    /// Number of rows
    pub fn num_embeddings(&self) -> usize {
        self.num_embeddings
    }

    /// Get hidden dimension
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}
