//! Per-run state shared by the reader, the trainer and the reporter.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SearnConfig;
use crate::policy::{Policy, PolicySchedule, PolicySelector};

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Running totals over every sequence seen so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Sum of example weights over processed positions.
    pub weighted_examples: f64,
    /// Weighted count of behavior-pass mistakes.
    pub sum_loss: f64,
    /// Sequences read, including skipped ones.
    pub sequences: u64,
    /// Features over processed positions, before history injection.
    pub total_features: u64,
    pub sequences_trained: u64,
    pub sequences_tested: u64,
    pub sequences_skipped: u64,
    /// Cost-sensitive examples handed to the learner.
    pub examples_emitted: u64,
}

impl RunStats {
    pub fn average_loss(&self) -> f64 {
        if self.weighted_examples > 0.0 {
            self.sum_loss / self.weighted_examples
        } else {
            0.0
        }
    }
}

/// What a finished run reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: RunStats,
    pub average_loss: f64,
    /// Number of frozen policies when the run ended.
    pub policies: usize,
}

impl RunSummary {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        std::fs::write(path.as_ref(), json).with_context(|| {
            format!("Failed to write run summary to {}", path.as_ref().display())
        })?;
        info!(path = %path.as_ref().display(), "Saved run summary");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Explicit replacement for process-wide training state.
#[derive(Debug)]
pub struct SearnContext {
    pub schedule: PolicySchedule,
    pub selector: PolicySelector,
    pub stats: RunStats,
    num_classes: usize,
    warned_class_overflow: bool,
    warned_missing_boundary: bool,
    started_at: DateTime<Utc>,
}

impl SearnContext {
    pub fn initialize(config: &SearnConfig) -> Self {
        Self {
            schedule: PolicySchedule::new(
                config.policy_budget(),
                config.sequence.passes_per_policy,
            ),
            selector: PolicySelector::new(config.sequence.beta, config.learner.seed),
            stats: RunStats::default(),
            num_classes: config.sequence.num_classes,
            warned_class_overflow: false,
            warned_missing_boundary: false,
            started_at: Utc::now(),
        }
    }

    /// A context for predicting with an already trained model: every policy
    /// the configuration could have produced counts as frozen.
    pub fn for_prediction(config: &SearnConfig) -> Self {
        let mut ctx = Self::initialize(config);
        ctx.schedule = PolicySchedule::all_frozen(
            config.policy_budget(),
            config.sequence.passes_per_policy,
        );
        ctx
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of frozen policies.
    pub fn policy_count(&self) -> usize {
        self.schedule.current()
    }

    pub fn choose_policy(&mut self, allow_oracle: bool, allow_current: bool) -> Policy {
        let count = self.schedule.current();
        self.selector.choose(count, allow_oracle, allow_current)
    }

    /// Policy used to report predictions: the first policy until one is
    /// frozen, afterwards a sample over the frozen ones.
    pub fn reporting_policy(&mut self) -> Policy {
        match self.schedule.current() {
            0 => Policy::Learned(0),
            _ => self.choose_policy(false, false),
        }
    }

    /// Clamp a true label into `1..=k`, warning the first time it happens.
    pub fn clamp_label(&mut self, class: u32, example: u64) -> u32 {
        let k = self.num_classes as u32;
        if (1..=k).contains(&class) {
            return class;
        }
        if !self.warned_class_overflow {
            warn!(
                classes = k,
                found = class,
                example,
                "label outside of 1..=k; replacing with k"
            );
            self.warned_class_overflow = true;
        }
        k
    }

    pub fn warn_missing_boundary(&mut self) {
        if !self.warned_missing_boundary {
            warn!("sequence data does not end in an empty example; please fix your data");
            self.warned_missing_boundary = true;
        }
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats: self.stats.clone(),
            average_loss: self.stats.average_loss(),
            policies: self.schedule.current(),
        }
    }

    pub fn finalize(self) -> RunSummary {
        self.summary()
    }
}
