//! Compute device selection
//!
//! The device is an explicit value handed to model and adapter constructors.
//! All kernels in this crate run on the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device a model and its adapters live on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU
    #[default]
    Cpu,
}

impl Device {
    /// Resolve a configured accelerator index
    ///
    /// Requesting an accelerator logs a warning and falls back to the host.
    pub fn select(gpu: Option<usize>) -> Self {
        if let Some(index) = gpu {
            tracing::warn!(gpu = index, "accelerator requested but this build computes on the host; using cpu");
        }
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}
