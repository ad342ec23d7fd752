//! Adapter manager: installs one adapter per attention layer and owns the mode

use super::attention_adapter::AttentionAdapter;
use super::mode::{AdapterMode, ModeHandle};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::transformer::{CausalLm, ModelFamily};
use crate::Tensor;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Learned weights of one layer's adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterWeights {
    /// Attention layer index
    pub layer: usize,
    /// Number of head groups (rows)
    pub head_count: usize,
    /// Number of demonstrations (columns)
    pub n_demo: usize,
    /// Row-major `[head_count, n_demo]` values
    pub values: Vec<f32>,
}

/// Creates, installs and toggles the adapters of one model
pub struct AdapterManager {
    family: ModelFamily,
    n_demo: usize,
    head_count: Option<usize>,
    device: Device,
    mode: ModeHandle,
    adapters: Vec<Rc<AttentionAdapter>>,
}

impl AdapterManager {
    /// Create a manager for `model_name`
    ///
    /// `head_count = None` gives every attention head its own row.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedModel`] if the name is not a supported family.
    pub fn new(model_name: &str, n_demo: usize, head_count: Option<usize>, device: Device) -> Result<Self> {
        Ok(Self {
            family: ModelFamily::from_model_name(model_name)?,
            n_demo,
            head_count,
            device,
            mode: ModeHandle::new(AdapterMode::Active),
            adapters: Vec::new(),
        })
    }

    /// Build one adapter per attention layer and place each in its layer's slot
    ///
    /// Either every layer receives an adapter or none does. Installing again
    /// replaces the previous adapters.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleAdapter`] on a family or device mismatch, or
    /// if a layer's head count cannot be grouped.
    pub fn install(&mut self, model: &mut CausalLm) -> Result<usize> {
        if model.family() != self.family {
            return Err(Error::IncompatibleAdapter {
                layer: 0,
                reason: format!("manager targets {} but the model is {}", self.family, model.family()),
            });
        }
        if model.device() != self.device {
            return Err(Error::IncompatibleAdapter {
                layer: 0,
                reason: format!("manager device {} differs from model device {}", self.device, model.device()),
            });
        }

        let adapters = model
            .attention_layers()
            .map(|attn| {
                AttentionAdapter::new(
                    attn.layer_index(),
                    attn.num_heads(),
                    self.head_count.unwrap_or(attn.num_heads()),
                    self.n_demo,
                    self.mode.clone(),
                )
                .map(Rc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        for (attn, adapter) in model.attention_layers_mut().zip(&adapters) {
            attn.install_adapter(Rc::clone(adapter));
        }

        tracing::debug!(layers = adapters.len(), n_demo = self.n_demo, family = %self.family, "installed attention adapters");
        self.adapters = adapters;
        Ok(self.adapters.len())
    }

    /// Trainable tensors of every installed adapter, in layer order
    ///
    /// The returned handles share storage with the layers' adapters.
    ///
    /// # Errors
    /// Returns [`Error::AdaptersNotInstalled`] before [`install`](Self::install).
    pub fn params(&self) -> Result<Vec<Tensor>> {
        if self.adapters.is_empty() {
            return Err(Error::AdaptersNotInstalled);
        }
        Ok(self.adapters.iter().map(|a| a.weight().clone()).collect())
    }

    /// Switch every adapter of this manager at once
    ///
    /// # Errors
    /// Returns [`Error::AdaptersNotInstalled`] before [`install`](Self::install).
    pub fn set_mode(&self, mode: AdapterMode) -> Result<()> {
        if self.adapters.is_empty() {
            return Err(Error::AdaptersNotInstalled);
        }
        self.mode.set(mode);
        tracing::debug!(%mode, "adapter mode changed");
        Ok(())
    }

    /// Current mode
    pub fn mode(&self) -> AdapterMode {
        self.mode.get()
    }

    /// Copy of the learned weights, one entry per layer
    pub fn snapshot(&self) -> Vec<AdapterWeights> {
        self.adapters
            .iter()
            .map(|a| AdapterWeights {
                layer: a.layer(),
                head_count: a.head_count(),
                n_demo: a.n_demo(),
                values: a.weight().to_vec(),
            })
            .collect()
    }

    /// Installed adapters
    pub fn adapters(&self) -> &[Rc<AttentionAdapter>] {
        &self.adapters
    }

    /// Target family
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Demonstrations per prompt
    pub fn n_demo(&self) -> usize {
        self.n_demo
    }
}
