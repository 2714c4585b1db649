//! Trained model files.
//!
//! A model is the learner's weight table together with the configuration it
//! was trained under. History orders, bigram toggles and the policy budget
//! decide which weights a prediction reads, so they travel with the weights.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SearnConfig;
use crate::learner::{CostSensitiveLearner, LinearCsoaa};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearnModel {
    /// Configuration of the run that produced the weights.
    pub config: SearnConfig,
    pub learner: LinearCsoaa,
}

impl SearnModel {
    pub fn new(config: SearnConfig, learner: LinearCsoaa) -> Self {
        Self { config, learner }
    }

    /// Configuration for predicting with this model.
    ///
    /// Everything that shapes features and policy blocks comes from the
    /// trained configuration; reporting, ring size and auditing come from
    /// `local`.
    pub fn prediction_config(&self, local: &SearnConfig) -> SearnConfig {
        let mut config = self.config.clone();
        config.report = local.report.clone();
        config.sequence.ring_size = local.sequence.ring_size;
        config.learner.audit = local.learner.audit;
        config
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize model to JSON")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write model to {}", path.as_ref().display()))?;
        info!(
            path = %path.as_ref().display(),
            classes = self.learner.num_classes(),
            policies = self.config.policy_budget(),
            updates = self.learner.updates(),
            "Saved model"
        );
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read model from {}", path.as_ref().display()))?;
        let mut model: Self =
            serde_json::from_str(&data).context("Failed to deserialize model JSON")?;

        model.learner.validate()?;
        model
            .config
            .validate()
            .context("model carries an invalid configuration")?;
        if model.config.sequence.num_classes != model.learner.num_classes() {
            anyhow::bail!(
                "model configuration has {} classes, learner has {}",
                model.config.sequence.num_classes,
                model.learner.num_classes()
            );
        }
        if model.config.learner.bits != model.learner.layout().bits {
            anyhow::bail!(
                "model configuration has {} bits, learner table has {}",
                model.config.learner.bits,
                model.learner.layout().bits
            );
        }

        info!(
            path = %path.as_ref().display(),
            classes = model.learner.num_classes(),
            policies = model.config.policy_budget(),
            updates = model.learner.updates(),
            "Loaded model"
        );
        Ok(model)
    }
}
