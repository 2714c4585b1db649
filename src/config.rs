use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SearnError};

/// Complete configuration for a Searn run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearnConfig {
    pub sequence: SequenceConfig,
    pub learner: LearnerConfig,
    pub report: ReportConfig,
}

/// Sequence labeling and rollout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Number of labels k; labels are `1..=k` (default: 2).
    pub num_classes: usize,
    /// How many past predictions become history features (default: 1).
    pub history: usize,
    /// How many past predictions are crossed with every input feature (default: 0).
    pub features: usize,
    /// Add adjacent-pair features over the history (default: false).
    pub bigrams: bool,
    /// Add adjacent-pair variants of the history/feature crosses (default: false).
    pub bigram_features: bool,
    /// Maximum number of positions simulated after a decision (default: 256).
    pub rollout: usize,
    /// Completed passes per newly frozen policy (default: 1).
    pub passes_per_policy: usize,
    /// Policy mixing parameter; values <= 0 are reset to 0.5 (default: 0.5).
    pub beta: f32,
    /// Per-step discount applied to rollout losses (default: 1.0).
    pub gamma: f32,
    /// Prune rollouts once all candidate histories coincide (default: true).
    pub optimize_shared_histories: bool,
    /// Maximum number of examples held for one sequence (default: 256).
    pub ring_size: usize,
}

/// Learner and data-pass configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// log2 of the weight table length (default: 18).
    pub bits: u32,
    /// SGD step size (default: 0.5).
    pub learning_rate: f32,
    /// Number of passes over the data (default: 1).
    pub passes: usize,
    /// Seed for policy sampling (default: 0).
    pub seed: u64,
    /// Keep human-readable feature names for debugging (default: false).
    pub audit: bool,
}

/// Progress reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report after every sequence instead of at doubling intervals.
    pub every_sequence: bool,
    /// Weighted-example count that triggers the first report (default: 1.0).
    pub initial_interval: f64,
    /// Suppress progress reports entirely.
    pub quiet: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            num_classes: 2,
            history: 1,
            features: 0,
            bigrams: false,
            bigram_features: false,
            rollout: 256,
            passes_per_policy: 1,
            beta: 0.5,
            gamma: 1.0,
            optimize_shared_histories: true,
            ring_size: 256,
        }
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            bits: 18,
            learning_rate: 0.5,
            passes: 1,
            seed: 0,
            audit: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            every_sequence: false,
            initial_interval: 1.0,
            quiet: false,
        }
    }
}

impl SequenceConfig {
    /// Number of slots in every history window.
    pub fn history_length(&self) -> usize {
        self.history.max(self.features)
    }
}

impl SearnConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Number of frozen policies the run can produce.
    pub fn policy_budget(&self) -> usize {
        let passes = self.learner.passes.max(1);
        let per_policy = self.sequence.passes_per_policy.max(1);
        passes.div_ceil(per_policy).max(1)
    }

    /// Check structural constraints and correct recoverable values in place.
    ///
    /// A non-positive `beta` is reset to 0.5 with a warning; everything else
    /// that cannot be used is rejected.
    pub fn validate(&mut self) -> Result<()> {
        let seq = &mut self.sequence;

        if seq.beta <= 0.0 || seq.beta.is_nan() {
            warn!(beta = seq.beta, "sequence beta set to a value <= 0; resetting to 0.5");
            seq.beta = 0.5;
        }
        if seq.num_classes == 0 {
            return Err(SearnError::InvalidConfig(
                "num_classes must be at least 1".into(),
            ));
        }
        if seq.ring_size == 0 {
            return Err(SearnError::InvalidConfig("ring_size must be at least 1".into()));
        }
        if seq.passes_per_policy == 0 {
            return Err(SearnError::InvalidConfig(
                "passes_per_policy must be at least 1".into(),
            ));
        }
        if !seq.gamma.is_finite() {
            return Err(SearnError::InvalidConfig(format!(
                "gamma must be finite, got {}",
                seq.gamma
            )));
        }
        if !(1..=30).contains(&self.learner.bits) {
            return Err(SearnError::InvalidConfig(format!(
                "bits must be in 1..=30, got {}",
                self.learner.bits
            )));
        }
        if self.learner.passes == 0 {
            return Err(SearnError::InvalidConfig("passes must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let mut config = SearnConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sequence.num_classes, 2);
        assert_eq!(config.sequence.history_length(), 1);
        assert_eq!(config.policy_budget(), 1);
    }

    #[test]
    fn test_non_positive_beta_is_reset() {
        let mut config = SearnConfig::default();
        config.sequence.beta = -1.0;
        config.validate().unwrap();
        assert!((config.sequence.beta - 0.5).abs() < 1e-9);

        config.sequence.beta = 0.0;
        config.validate().unwrap();
        assert!((config.sequence.beta - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_classes_rejected() {
        let mut config = SearnConfig::default();
        config.sequence.num_classes = 0;
        assert!(matches!(config.validate(), Err(SearnError::InvalidConfig(_))));
    }

    #[test]
    fn test_bits_out_of_range_rejected() {
        let mut config = SearnConfig::default();
        config.learner.bits = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_length_is_max_of_orders() {
        let mut config = SearnConfig::default();
        config.sequence.history = 2;
        config.sequence.features = 4;
        assert_eq!(config.sequence.history_length(), 4);
    }

    #[test]
    fn test_policy_budget_rounds_up() {
        let mut config = SearnConfig::default();
        config.learner.passes = 5;
        config.sequence.passes_per_policy = 2;
        assert_eq!(config.policy_budget(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("searn.json");
        std::fs::write(&path, r#"{ "sequence": { "num_classes": 5, "gamma": 0.9 } }"#).unwrap();

        let config = SearnConfig::load_from_file(&path).unwrap();
        assert_eq!(config.sequence.num_classes, 5);
        assert!((config.sequence.gamma - 0.9).abs() < 1e-6);
        assert_eq!(config.sequence.rollout, 256);
        assert_eq!(config.learner.bits, 18);
    }
}
