//! Reweighting trainer: optimizes adapter parameters on a frozen model

use super::config::TrainConfig;
use super::loss::{mean_loss, one_hot, CrossEntropyLoss, LossFn};
use crate::adapter::{AdapterManager, AdapterMode};
use crate::autograd::backward;
use crate::data::{EncodedPrompt, LabelIdMap};
use crate::error::{Error, Result};
use crate::optim::{Adam, Optimizer};
use crate::transformer::CausalLm;
use crate::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Outcome of [`ReweightingTrainer::train`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResult {
    /// Average batch loss of every epoch
    pub loss_curve: Vec<f32>,
    /// Optimizer steps taken
    pub steps: usize,
}

impl TrainResult {
    /// Average loss of the last epoch
    pub fn final_loss(&self) -> Option<f32> {
        self.loss_curve.last().copied()
    }
}

/// Trains the adapters installed by one [`AdapterManager`]
///
/// Only the manager's parameters are handed to the optimizer; the model's
/// own tensors never require gradient.
pub struct ReweightingTrainer<'a> {
    model: &'a CausalLm,
    label_ids: &'a LabelIdMap,
    params: Vec<Tensor>,
    optimizer: Box<dyn Optimizer>,
    loss_fn: Box<dyn LossFn>,
    config: TrainConfig,
    seed: u64,
}

impl<'a> ReweightingTrainer<'a> {
    /// Create a trainer and put the adapters in Active mode
    ///
    /// # Errors
    /// Returns [`Error::AdaptersNotInstalled`] if the manager has not installed
    /// its adapters, and [`Error::ConfigError`] for a zero batch size.
    pub fn new(
        model: &'a CausalLm,
        manager: &AdapterManager,
        label_ids: &'a LabelIdMap,
        config: TrainConfig,
        seed: u64,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::ConfigError("batch_size must be positive".to_string()));
        }
        let params = manager.params()?;
        manager.set_mode(AdapterMode::Active)?;
        Ok(Self {
            model,
            label_ids,
            params,
            optimizer: Box::new(Adam::default_params(config.lr)),
            loss_fn: Box::new(CrossEntropyLoss),
            config,
            seed,
        })
    }

    /// Cross-entropy of the label-token logits of one prompt
    ///
    /// # Errors
    /// Propagates forward-pass errors of the model and its adapters.
    pub fn prompt_loss(&self, prompt: &EncodedPrompt) -> Result<Tensor> {
        let logits = self.model.label_logits(&prompt.token_ids, &prompt.context(), self.label_ids.ids())?;
        Ok(self.loss_fn.forward(&logits, &one_hot(prompt.label, self.label_ids.len())))
    }

    /// Run every epoch over `prompts`
    ///
    /// Each epoch reshuffles the prompts with an RNG seeded once from the
    /// trainer's seed and records the mean of its batch losses.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] for an empty sample and
    /// [`Error::NumericInstability`] as soon as a batch loss is not finite.
    pub fn train(&mut self, prompts: &[EncodedPrompt]) -> Result<TrainResult> {
        if prompts.is_empty() {
            return Err(Error::InsufficientData(format!("seed {}: no training prompts", self.seed)));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..prompts.len()).collect();
        let mut loss_curve = Vec::with_capacity(self.config.epochs);
        let mut steps = 0;

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0;
            let mut num_batches = 0;

            for (batch_index, chunk) in order.chunks(self.config.batch_size).enumerate() {
                let batch: Vec<&EncodedPrompt> = chunk.iter().map(|&i| &prompts[i]).collect();
                total_loss += self.train_step(&batch, epoch, batch_index)?;
                num_batches += 1;
                steps += 1;
            }

            let avg_loss = total_loss / num_batches as f32;
            tracing::info!(seed = self.seed, epoch, loss = avg_loss, "epoch complete");
            loss_curve.push(avg_loss);
        }

        Ok(TrainResult { loss_curve, steps })
    }

    /// Forward, backward, step and zero_grad for one batch
    fn train_step(&mut self, batch: &[&EncodedPrompt], epoch: usize, batch_index: usize) -> Result<f32> {
        let losses = batch.iter().map(|p| self.prompt_loss(p)).collect::<Result<Vec<_>>>()?;
        let Some(loss) = mean_loss(&losses) else {
            return Ok(0.0);
        };

        let value = loss.data()[0];
        if !value.is_finite() {
            return Err(Error::NumericInstability { seed: self.seed, epoch, batch: batch_index, loss: value });
        }

        backward(&loss, None);
        self.optimizer.step(&mut self.params);
        self.optimizer.zero_grad(&mut self.params);
        tracing::trace!(epoch, batch = batch_index, loss = value, "step");
        Ok(value)
    }

    /// Current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }
}
