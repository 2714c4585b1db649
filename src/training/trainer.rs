//! Searn over one sequence at a time.
//!
//! A labeled sequence goes through three phases:
//!
//! 1. **Behavior pass** -- predict every position with the reporting policy
//!    to accumulate loss, and record which policy (possibly the oracle)
//!    rolls out each position.
//! 2. **Cost estimation** -- at every position, each of the `k` labels is
//!    asserted in turn and the rest of the sequence is rolled out from it.
//!    The accumulated rollout losses, shifted so the minimum is zero, become
//!    a cost vector.
//! 3. **Emission** -- the position's example, with the running history
//!    injected, is handed to the learner under the cost vector.
//!
//! ```text
//! ReadSequence -> ClassifyMode -+-> PredictOnly ------------------------------+-> Finalize
//!                               +-> BehaviorPass -> (CostEstimation -> Emit)* -+
//! ```
//!
//! Rollouts whose candidate histories coincide make identical predictions, so
//! with shared-history optimization on they reuse a sibling's prediction, and
//! rollout stops once all candidates agree.

use tracing::{debug, error, trace, warn};

use crate::config::SearnConfig;
use crate::error::Result;
use crate::example::{CostSensitiveLabel, Example, ExampleSource, Label};
use crate::history::{History, HistoryEncoder, DEFAULT_PREDICTION};
use crate::learner::CostSensitiveLearner;
use crate::policy::Policy;
use crate::rollout::{rollout_horizon, step_loss, RolloutCache};

use super::context::SearnContext;
use super::progress::ProgressReporter;
use super::reader::SequenceReader;

/// What happened to the sequence just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// The source had nothing left.
    Exhausted,
    /// Only boundary examples were read before the ring filled up.
    Empty,
    /// An unlabeled sequence was predicted.
    Tested { positions: usize },
    /// A labeled sequence contained unlabeled examples and was not trained on.
    Skipped { positions: usize },
    /// A labeled sequence produced `emitted` cost-sensitive examples.
    Trained { positions: usize, emitted: usize },
}

pub struct SequenceTrainer<L> {
    learner: L,
    encoder: HistoryEncoder,
    num_classes: usize,
    rollout: usize,
    gamma: f32,
    optimize_shared_histories: bool,

    // Scratch state, sized once and reused for every sequence.
    examples: Vec<Example>,
    truths: Vec<u32>,
    weights: Vec<f32>,
    policies: Vec<Policy>,
    behavior: Vec<u32>,
    realized: Vec<Option<u32>>,
    cache: RolloutCache,
    history: History,
    costs: Vec<f32>,
}

impl<L: CostSensitiveLearner> SequenceTrainer<L> {
    pub fn new(learner: L, config: &SearnConfig) -> Self {
        let seq = &config.sequence;
        let ring = seq.ring_size;
        let encoder = HistoryEncoder::new(
            seq,
            config.policy_budget(),
            learner.layout(),
            config.learner.audit,
        );
        Self {
            learner,
            encoder,
            num_classes: seq.num_classes,
            rollout: seq.rollout,
            gamma: seq.gamma,
            optimize_shared_histories: seq.optimize_shared_histories,
            examples: Vec::with_capacity(ring),
            truths: Vec::with_capacity(ring),
            weights: Vec::with_capacity(ring),
            policies: Vec::with_capacity(ring),
            behavior: Vec::with_capacity(ring),
            realized: Vec::with_capacity(ring),
            cache: RolloutCache::new(seq.num_classes, seq.history_length()),
            history: History::new(seq.history_length()),
            costs: Vec::with_capacity(seq.num_classes),
        }
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut L {
        &mut self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    /// Behavior-pass (or test) predictions for the last sequence.
    pub fn predictions(&self) -> &[u32] {
        &self.behavior
    }

    /// Realized predictions of the last trained sequence.
    pub fn realized(&self) -> &[Option<u32>] {
        &self.realized
    }

    // ------------------------------------------------------------------
    // Sequence driver
    // ------------------------------------------------------------------

    /// Read, process and release one sequence.
    pub fn process_next_sequence<S: ExampleSource>(
        &mut self,
        ctx: &mut SearnContext,
        reader: &mut SequenceReader<S>,
        reporter: &mut ProgressReporter,
    ) -> Result<SequenceOutcome> {
        reader.begin_sequence();

        let first = loop {
            match reader.next(ctx, true) {
                None if reader.is_exhausted() => return Ok(SequenceOutcome::Exhausted),
                None => return Ok(SequenceOutcome::Empty),
                Some(ex) if ex.is_boundary() => reader.release(ex),
                Some(ex) => break ex,
            }
        };

        self.examples.clear();
        self.examples.push(first);
        while let Some(ex) = reader.next(ctx, false) {
            if ex.is_boundary() {
                reader.release(ex);
                break;
            }
            self.examples.push(ex);
        }
        ctx.stats.sequences += 1;

        let n = self.examples.len();
        let result = if self.examples[0].is_test() {
            self.predict_sequence(ctx, reporter);
            Ok(SequenceOutcome::Tested { positions: n })
        } else if let Some(pos) = self.examples.iter().position(Example::is_test) {
            warn!(
                example = self.examples[pos].example_counter,
                "mix of train and test data in sequence; skipping"
            );
            ctx.stats.sequences_skipped += 1;
            Ok(SequenceOutcome::Skipped { positions: n })
        } else {
            self.train_sequence(ctx, reporter)
                .map(|emitted| SequenceOutcome::Trained { positions: n, emitted })
        };

        for ex in self.examples.drain(..) {
            reader.release(ex);
        }
        result
    }

    // ------------------------------------------------------------------
    // Test sequences
    // ------------------------------------------------------------------

    fn predict_sequence(&mut self, ctx: &mut SearnContext, reporter: &mut ProgressReporter) {
        if let Some(ex) = self.examples.iter().find(|ex| !ex.is_test()) {
            warn!(
                example = ex.example_counter,
                "mix of train and test data in sequence; assuming all test"
            );
        }

        self.history.clear();
        self.behavior.clear();
        let mut features = 0;
        for t in 0..self.examples.len() {
            let policy = ctx.reporting_policy();
            let ex = &mut self.examples[t];
            let weight = ex.multiclass().map_or(1.0, |label| label.weight);
            features += ex.num_features();
            ctx.stats.weighted_examples += weight as f64;
            ctx.stats.total_features += ex.num_features() as u64;

            let y = self
                .encoder
                .predict(&mut self.learner, ex, &self.history, policy, None);
            self.history.append(y);
            self.behavior.push(y);
        }
        ctx.stats.sequences_tested += 1;
        debug!(predictions = ?self.behavior, "predicted sequence");
        reporter.report(&ctx.stats, self.num_classes, &[], &self.behavior, features);
    }

    // ------------------------------------------------------------------
    // Training sequences
    // ------------------------------------------------------------------

    fn train_sequence(
        &mut self,
        ctx: &mut SearnContext,
        reporter: &mut ProgressReporter,
    ) -> Result<usize> {
        let n = self.examples.len();
        self.truths.clear();
        self.weights.clear();
        for ex in &self.examples {
            let label = ex.multiclass();
            self.truths
                .push(label.and_then(|l| l.class).unwrap_or(DEFAULT_PREDICTION));
            self.weights.push(label.map_or(1.0, |l| l.weight));
        }

        let features = self.behavior_pass(ctx);
        ctx.stats.sequences_trained += 1;
        reporter.report(&ctx.stats, self.num_classes, &self.truths, &self.behavior, features);

        self.history.clear();
        self.realized.clear();
        self.realized.resize(n, None);
        self.realized[0] = Some(self.predict_realized(0));

        let policy = ctx.policy_count();
        for t in 0..n {
            self.estimate_costs(t, n);
            self.cache.write_costs(&mut self.costs);
            self.emit(t, policy)?;
            ctx.stats.examples_emitted += 1;

            let y = match self.realized[t] {
                Some(y) if (1..=self.num_classes as u32).contains(&y) => y,
                other => {
                    error!(
                        position = t,
                        prediction = ?other,
                        "internal error (bug): did not find actual predicted path; defaulting to 1"
                    );
                    DEFAULT_PREDICTION
                }
            };
            self.history.append(y);

            if t + 1 < n && self.realized[t + 1].is_none() {
                self.realized[t + 1] = Some(self.predict_realized(t + 1));
            }
        }
        Ok(n)
    }

    /// Predict every position once to accumulate loss statistics and pick
    /// the rollout policy of each position. Returns the sequence's feature
    /// count.
    fn behavior_pass(&mut self, ctx: &mut SearnContext) -> usize {
        self.history.clear();
        self.behavior.clear();
        self.policies.clear();
        let mut features = 0;

        for t in 0..self.examples.len() {
            let policy = ctx.reporting_policy();
            let (truth, weight) = (self.truths[t], self.weights[t]);
            let ex = &mut self.examples[t];
            features += ex.num_features();
            ctx.stats.weighted_examples += weight as f64;
            ctx.stats.total_features += ex.num_features() as u64;

            let y = self
                .encoder
                .predict(&mut self.learner, ex, &self.history, policy, Some(truth));
            self.history.append(y);
            self.behavior.push(y);
            if y != truth {
                ctx.stats.sum_loss += weight as f64;
            }

            let rollout_policy = match ctx.choose_policy(true, false) {
                Policy::Oracle => Policy::Oracle,
                _ => policy,
            };
            self.policies.push(rollout_policy);
        }
        features
    }

    /// Predict position `t` from the running history under its rollout policy.
    fn predict_realized(&mut self, t: usize) -> u32 {
        self.encoder.predict(
            &mut self.learner,
            &mut self.examples[t],
            &self.history,
            self.policies[t],
            Some(self.truths[t]),
        )
    }

    // ------------------------------------------------------------------
    // Rollouts
    // ------------------------------------------------------------------

    /// Fill the rollout cache with every candidate's loss for position `t`.
    /// May also recover the realized prediction for `t + 1`.
    fn estimate_costs(&mut self, t: usize, n: usize) {
        self.cache.seed(&self.history, self.weights[t], self.truths[t]);
        let end = rollout_horizon(t, n, self.rollout, &self.policies);
        let realized = self.realized[t];

        let mut discount = 1.0f32;
        for t2 in t + 1..end {
            discount *= self.gamma;
            if self.optimize_shared_histories {
                self.cache.sort_and_mark_duplicates();
                if self.cache.all_duplicate() {
                    break;
                }
            }

            let mut last_fresh: Option<(usize, u32)> = None;
            for i in 0..self.cache.len() {
                let item = &self.cache.items()[i];
                let asserts_realized = t2 == t + 1 && Some(item.history.last()) == realized;
                let duplicate = self.optimize_shared_histories && item.duplicate;

                let y = match (duplicate, last_fresh) {
                    (true, Some((source, y))) => {
                        self.copy_from_duplicate(i, source, y, t2, discount);
                        y
                    }
                    (true, None) => {
                        error!(
                            position = t2,
                            "internal error (bug): histories match, but no fresh sibling; simulating"
                        );
                        let y = self.simulate_fresh(i, t2, discount);
                        last_fresh = Some((i, y));
                        y
                    }
                    (false, _) => {
                        let y = self.simulate_fresh(i, t2, discount);
                        last_fresh = Some((i, y));
                        y
                    }
                };
                self.finish_step(i, t, asserts_realized, y);
            }
        }
    }

    /// Predict position `t2` from candidate `i`'s own history and extend it.
    fn simulate_fresh(&mut self, i: usize, t2: usize, discount: f32) -> u32 {
        let pow = self.cache.pow();
        let item = &mut self.cache.items_mut()[i];
        let y = self.encoder.predict(
            &mut self.learner,
            &mut self.examples[t2],
            &item.history,
            self.policies[t2],
            Some(self.truths[t2]),
        );
        item.push(y, pow);
        item.loss += step_loss(y, self.truths[t2], self.weights[t2], discount);
        y
    }

    /// Reuse the prediction `y` that candidate `source` just made from an
    /// identical history.
    fn copy_from_duplicate(&mut self, i: usize, source: usize, y: u32, t2: usize, discount: f32) {
        self.cache.copy_from(i, source);
        let item = &mut self.cache.items_mut()[i];
        item.loss += step_loss(y, self.truths[t2], self.weights[t2], discount);
    }

    fn finish_step(&mut self, i: usize, t: usize, asserts_realized: bool, y: u32) {
        self.cache.items_mut()[i].duplicate = false;
        if asserts_realized {
            self.realized[t + 1] = Some(y);
        }
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    /// Train the current policy on position `t` under the cost vector in
    /// `self.costs`, then put the example's label back.
    fn emit(&mut self, t: usize, policy: usize) -> Result<()> {
        debug!(position = t, policy, costs = ?self.costs, "cost-sensitive example");

        let costs = std::mem::take(&mut self.costs);
        let ex = &mut self.examples[t];
        let original = std::mem::replace(&mut ex.label, Label::Costs(CostSensitiveLabel { costs }));

        let learner = &mut self.learner;
        let result = self.encoder.with_encoded(ex, &self.history, policy, |ex| {
            trace!(
                position = t,
                features = ?ex.features().map(|f| (f.weight_index, f.value)).collect::<Vec<_>>(),
                "learning"
            );
            learner.learn(ex)
        });

        if let Label::Costs(label) = std::mem::replace(&mut ex.label, original) {
            self.costs = label.costs;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};

    use crate::config::ReportConfig;
    use crate::example::{Feature, MulticlassLabel, HISTORY_NAMESPACE};
    use crate::learner::TableLayout;

    /// Records every call; predictions are a function of the feature indices.
    #[derive(Default)]
    struct Recorder {
        constant: Option<u32>,
        /// History feature index -> label; when set, predict the label the
        /// most recent history slot holds.
        echo: Option<HashMap<u32, u32>>,
        predicts: usize,
        learned: Vec<Vec<f32>>,
    }

    impl CostSensitiveLearner for Recorder {
        fn layout(&self) -> TableLayout {
            TableLayout::new(12)
        }

        fn predict(&mut self, example: &Example) -> u32 {
            self.predicts += 1;
            if let Some(echo) = &self.echo {
                return example
                    .namespaces()
                    .iter()
                    .filter(|ns| ns.id == HISTORY_NAMESPACE)
                    .flat_map(|ns| ns.features.iter())
                    .find_map(|f| echo.get(&f.weight_index).copied())
                    .unwrap_or(1);
            }
            match self.constant {
                Some(y) => y,
                None => {
                    let sum = example
                        .features()
                        .fold(0u32, |acc, f| acc.wrapping_add(f.weight_index));
                    sum % 3 + 1
                }
            }
        }

        fn learn(&mut self, example: &Example) -> Result<()> {
            let costs = example
                .label
                .costs()
                .ok_or(crate::error::SearnError::MissingCosts)?;
            self.learned.push(costs.to_vec());
            Ok(())
        }
    }

    /// Hands out queued examples and keeps whatever comes back.
    #[derive(Default)]
    struct Collect {
        queue: VecDeque<Example>,
        released: Vec<Example>,
    }

    impl ExampleSource for Collect {
        fn next_example(&mut self) -> Option<Example> {
            self.queue.pop_front()
        }

        fn release(&mut self, example: Example) {
            self.released.push(example);
        }
    }

    fn labeled(class: u32, feature: u32) -> Example {
        let mut ex = Example::new(MulticlassLabel::new(class, 1.0));
        ex.namespace_entry(b'w').push(Feature::new(feature, 1.0));
        ex
    }

    fn unlabeled(feature: u32) -> Example {
        let mut ex = Example::new(MulticlassLabel::test());
        ex.namespace_entry(b'w').push(Feature::new(feature, 1.0));
        ex
    }

    fn config(passes: usize, beta: f32) -> SearnConfig {
        let mut config = SearnConfig::default();
        config.sequence.num_classes = 3;
        config.sequence.beta = beta;
        config.learner.passes = passes;
        config.report.quiet = true;
        config
    }

    struct Harness {
        ctx: SearnContext,
        reader: SequenceReader<Collect>,
        reporter: ProgressReporter,
        trainer: SequenceTrainer<Recorder>,
    }

    impl Harness {
        fn new(config: &SearnConfig, learner: Recorder, examples: Vec<Example>) -> Self {
            let source = Collect {
                queue: examples.into(),
                released: Vec::new(),
            };
            Self {
                ctx: SearnContext::initialize(config),
                reader: SequenceReader::new(source, config.sequence.ring_size),
                reporter: ProgressReporter::new(&ReportConfig::default(), chrono::Utc::now()),
                trainer: SequenceTrainer::new(learner, config),
            }
        }

        /// Pretend one policy has already been frozen.
        fn freeze_one(mut self) -> Self {
            self.ctx.schedule.on_pass_boundary();
            assert_eq!(self.ctx.policy_count(), 1);
            self
        }

        fn step(&mut self) -> SequenceOutcome {
            self.trainer
                .process_next_sequence(&mut self.ctx, &mut self.reader, &mut self.reporter)
                .unwrap()
        }
    }

    fn sequence() -> Vec<Example> {
        vec![labeled(1, 10), labeled(2, 20), labeled(3, 30), labeled(1, 40)]
    }

    /// Unigram history feature index of every label under policy 0.
    fn echo_table(cfg: &SearnConfig) -> HashMap<u32, u32> {
        let encoder =
            HistoryEncoder::new(&cfg.sequence, cfg.policy_budget(), TableLayout::new(12), false);
        let table: HashMap<u32, u32> = (1..=cfg.sequence.num_classes as u32)
            .map(|y| {
                let mut history = History::new(1);
                history.append(y);
                let mut ex = Example::new(MulticlassLabel::test());
                encoder.inject_features(&mut ex, &history).unwrap();
                (ex.namespaces().last().unwrap().features[0].weight_index, y)
            })
            .collect();
        assert_eq!(table.len(), cfg.sequence.num_classes);
        table
    }

    #[test]
    fn test_first_policy_trains_against_oracle_rollouts() {
        let cfg = config(1, 0.5);
        let mut h = Harness::new(&cfg, Recorder::default(), sequence());

        let outcome = h.step();
        assert_eq!(outcome, SequenceOutcome::Trained { positions: 4, emitted: 4 });

        let learned = &h.trainer.learner().learned;
        assert_eq!(learned.len(), 4);
        // no frozen policy yet, so every rollout uses the oracle and only
        // the immediate mistake costs anything
        assert_eq!(learned[0], vec![0.0, 1.0, 1.0]);
        assert_eq!(learned[1], vec![1.0, 0.0, 1.0]);
        assert_eq!(learned[2], vec![1.0, 1.0, 0.0]);
        assert_eq!(learned[3], vec![0.0, 1.0, 1.0]);
        assert_eq!(h.ctx.stats.examples_emitted, 4);
    }

    #[test]
    fn test_labels_restored_and_all_released() {
        let cfg = config(2, 1.0);
        let mut data = sequence();
        data.push(Example::boundary());
        let mut h = Harness::new(&cfg, Recorder::default(), data).freeze_one();

        h.step();
        assert_eq!(h.step(), SequenceOutcome::Exhausted);

        let source = h.reader.into_source();
        let released = &source.released;
        assert_eq!(released.len(), 5);
        let classes: Vec<Option<u32>> = released
            .iter()
            .filter(|ex| !ex.is_boundary())
            .map(|ex| ex.multiclass().and_then(|l| l.class))
            .collect();
        assert_eq!(classes, vec![Some(1), Some(2), Some(3), Some(1)]);
        assert!(released.iter().all(|ex| ex.num_features() <= 1));
    }

    #[test]
    fn test_costs_are_nonnegative_with_a_zero() {
        let cfg = config(2, 1.0);
        let mut h = Harness::new(&cfg, Recorder::default(), sequence()).freeze_one();
        h.step();

        for costs in &h.trainer.learner().learned {
            assert_eq!(costs.len(), 3);
            assert!(costs.iter().all(|c| *c >= 0.0));
            assert!(costs.iter().any(|c| *c == 0.0));
        }
    }

    #[test]
    fn test_shared_history_pruning_saves_predictions() {
        let run = |optimize: bool| {
            let mut cfg = config(2, 1.0);
            cfg.sequence.optimize_shared_histories = optimize;
            let learner = Recorder {
                constant: Some(1),
                ..Recorder::default()
            };
            let mut h = Harness::new(&cfg, learner, sequence()).freeze_one();
            h.step();
            let learner = h.trainer.into_learner();
            (learner.predicts, learner.learned)
        };

        let (pruned, pruned_costs) = run(true);
        let (full, full_costs) = run(false);
        // behavior 4 + first realized 1 + rollouts
        assert_eq!(full, 4 + 1 + 9 + 6 + 3);
        assert_eq!(pruned, 4 + 1 + 3 + 3 + 3);
        assert_eq!(pruned_costs, full_costs);
    }

    #[test]
    fn test_rollout_losses_are_discounted() {
        let run = |gamma: f32| {
            let mut cfg = config(2, 1.0);
            cfg.sequence.gamma = gamma;
            let learner = Recorder {
                echo: Some(echo_table(&cfg)),
                ..Recorder::default()
            };
            let mut h = Harness::new(&cfg, learner, sequence()).freeze_one();
            h.step();
            h.trainer.into_learner().learned
        };

        // every rollout repeats the candidate's own label, so a candidate
        // pays gamma^step for each later position whose truth differs
        let discounted = run(0.5);
        assert_eq!(discounted[0], vec![0.0, 0.625, 0.875]);
        assert_eq!(discounted[1], vec![0.75, 0.0, 0.5]);
        assert_eq!(discounted[2], vec![0.5, 1.0, 0.0]);
        assert_eq!(discounted[3], vec![0.0, 1.0, 1.0]);

        let undiscounted = run(1.0);
        assert_eq!(undiscounted[0], vec![0.0, 1.0, 1.0]);
        assert_eq!(undiscounted[1], vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pruning_matches_full_rollouts_with_history_dependent_learner() {
        for history in 1..=3 {
            for gamma in [1.0, 0.5] {
                let run = |optimize: bool| {
                    let mut cfg = config(2, 1.0);
                    cfg.sequence.history = history;
                    cfg.sequence.gamma = gamma;
                    cfg.sequence.optimize_shared_histories = optimize;
                    let data = vec![
                        labeled(1, 10),
                        labeled(2, 20),
                        labeled(3, 30),
                        labeled(1, 40),
                        labeled(2, 50),
                        labeled(3, 60),
                    ];
                    let mut h = Harness::new(&cfg, Recorder::default(), data).freeze_one();
                    h.step();
                    let learner = h.trainer.into_learner();
                    (learner.predicts, learner.learned)
                };

                let (pruned, pruned_costs) = run(true);
                let (full, full_costs) = run(false);
                assert_eq!(pruned_costs, full_costs, "history {history}, gamma {gamma}");
                assert!(pruned <= full);
            }
        }
    }

    #[test]
    fn test_realized_predictions_recovered_from_rollouts() {
        let run = |rollout: usize| {
            let mut cfg = config(2, 1.0);
            cfg.sequence.rollout = rollout;
            cfg.sequence.history = 2;
            let mut h = Harness::new(&cfg, Recorder::default(), sequence()).freeze_one();
            h.step();
            h.trainer.realized().to_vec()
        };

        let without_rollout = run(0);
        let with_rollout = run(256);
        assert!(without_rollout.iter().all(Option::is_some));
        assert_eq!(with_rollout, without_rollout);
    }

    #[test]
    fn test_unlabeled_sequence_is_predicted() {
        let cfg = config(1, 0.5);
        let data = vec![unlabeled(1), unlabeled(2), Example::boundary(), unlabeled(3)];
        let mut h = Harness::new(&cfg, Recorder::default(), data);

        assert_eq!(h.step(), SequenceOutcome::Tested { positions: 2 });
        assert_eq!(h.trainer.predictions().len(), 2);
        assert_eq!(h.step(), SequenceOutcome::Tested { positions: 1 });
        assert_eq!(h.step(), SequenceOutcome::Exhausted);
        assert!(h.trainer.learner().learned.is_empty());
        assert_eq!(h.ctx.stats.sequences_tested, 2);
    }

    #[test]
    fn test_mixed_training_sequence_is_skipped() {
        let cfg = config(1, 0.5);
        let data = vec![labeled(1, 1), unlabeled(2), labeled(2, 3)];
        let mut h = Harness::new(&cfg, Recorder::default(), data);

        assert_eq!(h.step(), SequenceOutcome::Skipped { positions: 3 });
        assert!(h.trainer.learner().learned.is_empty());
        assert_eq!(h.ctx.stats.sequences_skipped, 1);
        assert_eq!(h.reader.released(), 3);
    }

    #[test]
    fn test_leading_boundaries_are_skipped() {
        let cfg = config(1, 0.5);
        let data = vec![Example::boundary(), Example::boundary(), labeled(2, 1)];
        let mut h = Harness::new(&cfg, Recorder::default(), data);

        assert_eq!(h.step(), SequenceOutcome::Trained { positions: 1, emitted: 1 });
        assert_eq!(h.reader.released(), 3);
    }

    #[test]
    fn test_ring_capacity_splits_sequence() {
        let mut cfg = config(1, 0.5);
        cfg.sequence.ring_size = 3;
        let mut h = Harness::new(&cfg, Recorder::default(), sequence());

        assert_eq!(h.step(), SequenceOutcome::Trained { positions: 3, emitted: 3 });
        assert_eq!(h.step(), SequenceOutcome::Trained { positions: 1, emitted: 1 });
        assert_eq!(h.step(), SequenceOutcome::Exhausted);
    }
}
