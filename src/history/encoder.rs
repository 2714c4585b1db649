//! Turns a prediction history into features and routes examples into a
//! policy's region of the weight table.
//!
//! Every call that shapes an example comes in a matched pair:
//! [`HistoryEncoder::inject_features`] / [`HistoryEncoder::remove_features`]
//! and [`HistoryEncoder::apply_policy_offset`] /
//! [`HistoryEncoder::remove_policy_offset`]. Nothing else may add a namespace
//! to the example between an inject and its remove.

use tracing::{error, trace};

use crate::config::SequenceConfig;
use crate::error::{Result, SearnError};
use crate::example::{Example, Feature, Namespace, HISTORY_NAMESPACE};
use crate::learner::{CostSensitiveLearner, TableLayout};
use crate::policy::Policy;

use super::window::History;

/// Multiplier used to combine history values, offsets and feature indices.
pub const QUADRATIC_CONSTANT: u32 = 27_942_141;
/// Salt separating history features from ordinary input features.
pub const HISTORY_SALT: u32 = 8_290_741;
/// Prediction used when an internal invariant leaves no valid answer.
pub const DEFAULT_PREDICTION: u32 = 1;

const Q: u32 = QUADRATIC_CONSTANT;

#[derive(Debug, Clone)]
pub struct HistoryEncoder {
    history_order: usize,
    feature_order: usize,
    bigrams: bool,
    bigram_features: bool,
    num_classes: usize,
    policy_budget: usize,
    layout: TableLayout,
    audit: bool,
}

impl HistoryEncoder {
    pub fn new(
        config: &SequenceConfig,
        policy_budget: usize,
        layout: TableLayout,
        audit: bool,
    ) -> Self {
        Self {
            history_order: config.history,
            feature_order: config.features,
            bigrams: config.bigrams,
            bigram_features: config.bigram_features,
            num_classes: config.num_classes.max(1),
            policy_budget: policy_budget.max(1),
            layout,
            audit,
        }
    }

    // ------------------------------------------------------------------
    // History features
    // ------------------------------------------------------------------

    /// Append the history namespace derived from `history` to the example.
    ///
    /// The window must hold at least `max(history, features)` slots.
    pub fn inject_features(&self, example: &mut Example, history: &History) -> Result<()> {
        if example.has_namespace(HISTORY_NAMESPACE) {
            return Err(SearnError::HistoryNamespace(
                "history features are already present".into(),
            ));
        }

        let mask = self.layout.parse_mask();
        let mut ns = example.begin_namespace(HISTORY_NAMESPACE);

        for t in 1..=self.history_order {
            let recent = history.back(t);
            let mut v0 = recent
                .wrapping_mul(Q)
                .wrapping_add(t as u32)
                .wrapping_mul(Q)
                .wrapping_add(HISTORY_SALT);
            self.push(&mut ns, v0.wrapping_mul(2) & mask, || format!("ug@{t}={recent}"));

            if self.bigrams && t > 1 {
                let newer = history.back(t - 1);
                v0 = v0
                    .wrapping_sub(HISTORY_SALT)
                    .wrapping_mul(Q)
                    .wrapping_add(newer)
                    .wrapping_mul(Q)
                    .wrapping_add(HISTORY_SALT);
                self.push(&mut ns, v0.wrapping_mul(2) & mask, || {
                    format!("bg@{}={recent}-{newer}", t - 1)
                });
            }
        }

        if self.feature_order > 0 {
            for source in example.namespaces() {
                for (j, feature) in source.features.iter().enumerate() {
                    let v = feature.weight_index.wrapping_add(HISTORY_SALT);
                    let name = || {
                        source
                            .audit
                            .get(j)
                            .cloned()
                            .unwrap_or_else(|| format!("{{{}}}", feature.weight_index))
                    };

                    for t in 1..=self.feature_order {
                        let recent = history.back(t);
                        let mut v0 = recent
                            .wrapping_mul(Q)
                            .wrapping_add(t as u32)
                            .wrapping_mul(Q);
                        let index = v0.wrapping_add(v).wrapping_mul(2) & mask;
                        self.push(&mut ns, index, || format!("ug+f@{t}={recent}={}", name()));

                        if self.bigram_features && t > 1 {
                            let newer = history.back(t - 1);
                            v0 = v0.wrapping_add(newer).wrapping_mul(Q);
                            let index = v0.wrapping_add(v).wrapping_mul(2) & mask;
                            self.push(&mut ns, index, || {
                                format!("bg+f@{}={recent}-{newer}={}", t - 1, name())
                            });
                        }
                    }
                }
            }
        }

        example.push_namespace(ns);
        Ok(())
    }

    /// Strip the namespace added by the most recent `inject_features`.
    pub fn remove_features(&self, example: &mut Example) -> Result<()> {
        match example.last_namespace() {
            None => Err(SearnError::HistoryNamespace(
                "trying to remove history, but there are no namespaces".into(),
            )),
            Some(id) if id != HISTORY_NAMESPACE => Err(SearnError::HistoryNamespace(
                "history was not added, or something was added after it and not removed".into(),
            )),
            Some(_) => {
                if let Some(ns) = example.pop_namespace() {
                    example.recycle_namespace(ns);
                }
                Ok(())
            }
        }
    }

    fn push(&self, ns: &mut Namespace, index: u32, name: impl FnOnce() -> String) {
        ns.push(Feature::new(index, 1.0));
        if self.audit {
            ns.audit.push(name());
        }
    }

    // ------------------------------------------------------------------
    // Policy offsets
    // ------------------------------------------------------------------

    /// Start of `policy`'s block inside each class block of the weight table.
    pub fn policy_offset(&self, policy: usize) -> u32 {
        let block = policy * self.layout.length() / self.num_classes / self.policy_budget;
        (block * self.layout.stride as usize) as u32
    }

    pub fn apply_policy_offset(&self, example: &mut Example, policy: usize) {
        example.shift_indices(self.policy_offset(policy), true);
    }

    pub fn remove_policy_offset(&self, example: &mut Example, policy: usize) {
        example.shift_indices(self.policy_offset(policy), false);
    }

    // ------------------------------------------------------------------
    // Encoded learner calls
    // ------------------------------------------------------------------

    /// Run `f` on the example with `history` injected and `policy`'s offset
    /// applied, then undo both.
    pub fn with_encoded<R>(
        &self,
        example: &mut Example,
        history: &History,
        policy: usize,
        f: impl FnOnce(&mut Example) -> R,
    ) -> R {
        let injected = match self.inject_features(example, history) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    error = %err,
                    example = example.example_counter,
                    "internal error (bug): could not inject history"
                );
                false
            }
        };
        self.apply_policy_offset(example, policy);

        let out = f(example);

        self.remove_policy_offset(example, policy);
        if injected {
            if let Err(err) = self.remove_features(example) {
                error!(
                    error = %err,
                    example = example.example_counter,
                    "internal error (bug): could not remove history"
                );
            }
        }
        out
    }

    /// Predict the label at `example` under `policy` from `history`.
    ///
    /// The oracle answers with `truth`; a learned policy asks the learner
    /// inside its own region of the weight table.
    pub fn predict<L: CostSensitiveLearner>(
        &self,
        learner: &mut L,
        example: &mut Example,
        history: &History,
        policy: Policy,
        truth: Option<u32>,
    ) -> u32 {
        let prediction = match policy {
            Policy::Oracle => truth.unwrap_or_else(|| {
                error!(
                    example = example.example_counter,
                    "internal error (bug): oracle consulted without a true label; defaulting"
                );
                DEFAULT_PREDICTION
            }),
            Policy::Learned(id) => {
                self.with_encoded(example, history, id, |ex| learner.predict(ex))
            }
        };
        trace!(?policy, prediction, history = ?history.slots(), "predicted");
        prediction
    }
}
