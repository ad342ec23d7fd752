//! Active/bypassed ablation over the evaluation sample

use super::prediction::{Prediction, PredictionSet};
use crate::adapter::{AdapterManager, AdapterMode};
use crate::autograd::no_grad;
use crate::data::{EncodedPrompt, LabelIdMap};
use crate::error::Result;
use crate::transformer::CausalLm;

/// Predictions of the two evaluation passes
#[derive(Debug, Clone, PartialEq)]
pub struct AblationResult {
    /// Pass with the adapters in the mode training left them in (Active)
    pub active: PredictionSet,
    /// Pass with every adapter bypassed
    pub bypassed: PredictionSet,
}

/// Runs the evaluation sample with adapters on, then off
pub struct AblationDriver<'a> {
    model: &'a CausalLm,
    manager: &'a AdapterManager,
    label_ids: &'a LabelIdMap,
}

impl<'a> AblationDriver<'a> {
    /// Create a driver for one seed's model and manager
    pub fn new(model: &'a CausalLm, manager: &'a AdapterManager, label_ids: &'a LabelIdMap) -> Self {
        Self { model, manager, label_ids }
    }

    /// Predict every prompt in the current adapter mode, without recording a graph
    ///
    /// # Errors
    /// Propagates forward-pass errors.
    pub fn predict(&self, prompts: &[EncodedPrompt]) -> Result<PredictionSet> {
        let _guard = no_grad();
        prompts
            .iter()
            .map(|prompt| {
                let logits = self.model.label_logits(&prompt.token_ids, &prompt.context(), self.label_ids.ids())?;
                Ok(Prediction::from_logits(prompt.label, logits.to_vec()))
            })
            .collect::<Result<Vec<_>>>()
            .map(PredictionSet::new)
    }

    /// Pass 1 in the current mode, then switch to Bypassed and run pass 2
    ///
    /// The manager is left in Bypassed mode.
    ///
    /// # Errors
    /// Propagates forward-pass errors and [`crate::Error::AdaptersNotInstalled`].
    pub fn run(&self, prompts: &[EncodedPrompt]) -> Result<AblationResult> {
        let mode = self.manager.mode();
        let active = self.predict(prompts)?;
        tracing::info!(%mode, accuracy = active.accuracy(), n = active.len(), "evaluation pass 1");

        self.manager.set_mode(AdapterMode::Bypassed)?;
        let bypassed = self.predict(prompts)?;
        tracing::info!(
            mode = %AdapterMode::Bypassed,
            accuracy = bypassed.accuracy(),
            changed = active.disagreements(&bypassed),
            "evaluation pass 2"
        );
        tracing::debug!("active\n{}", active.confusion_matrix(self.label_ids.len()));
        tracing::debug!("bypassed\n{}", bypassed.confusion_matrix(self.label_ids.len()));

        Ok(AblationResult { active, bypassed })
    }
}
