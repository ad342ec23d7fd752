//! Adapter mode shared by every adapter of one manager

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Whether installed adapters perturb attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterMode {
    /// Reweight anchor attention by the learned factors
    #[default]
    Active,
    /// Pass attention weights through unchanged
    Bypassed,
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterMode::Active => write!(f, "active"),
            AdapterMode::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// Shared, read-mostly view of a manager's mode
///
/// Adapters hold clones of the handle; only the crate (through
/// [`AdapterManager::set_mode`](super::AdapterManager::set_mode)) writes it.
#[derive(Debug, Clone, Default)]
pub struct ModeHandle(Rc<Cell<AdapterMode>>);

impl ModeHandle {
    /// New handle starting in `mode`
    pub fn new(mode: AdapterMode) -> Self {
        Self(Rc::new(Cell::new(mode)))
    }

    /// Current mode
    pub fn get(&self) -> AdapterMode {
        self.0.get()
    }

    pub(crate) fn set(&self, mode: AdapterMode) {
        self.0.set(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_observe_one_cell() {
        let handle = ModeHandle::new(AdapterMode::Active);
        let seen_by_adapter = handle.clone();
        handle.set(AdapterMode::Bypassed);
        assert_eq!(seen_by_adapter.get(), AdapterMode::Bypassed);
    }

    #[test]
    fn test_default_is_active() {
        assert_eq!(ModeHandle::default().get(), AdapterMode::Active);
        assert_eq!(AdapterMode::Bypassed.to_string(), "bypassed");
    }
}
