//! Runs the sequence trainer over a whole source.

use tracing::info;

use crate::config::SearnConfig;
use crate::error::{Result, SearnError};
use crate::example::ExampleSource;
use crate::learner::CostSensitiveLearner;

use super::context::{RunSummary, SearnContext};
use super::progress::ProgressReporter;
use super::reader::SequenceReader;
use super::trainer::{SequenceOutcome, SequenceTrainer};

pub struct SearnDriver<L> {
    config: SearnConfig,
    trainer: SequenceTrainer<L>,
    ctx: SearnContext,
}

impl<L: CostSensitiveLearner> SearnDriver<L> {
    /// Validate the configuration and set up a training run.
    pub fn new(learner: L, mut config: SearnConfig) -> Result<Self> {
        config.validate()?;
        let ctx = SearnContext::initialize(&config);
        Ok(Self {
            trainer: SequenceTrainer::new(learner, &config),
            config,
            ctx,
        })
    }

    /// Set up a prediction-only run with every trained policy frozen.
    pub fn for_prediction(learner: L, mut config: SearnConfig) -> Result<Self> {
        config.validate()?;
        let ctx = SearnContext::for_prediction(&config);
        Ok(Self {
            trainer: SequenceTrainer::new(learner, &config),
            config,
            ctx,
        })
    }

    pub fn config(&self) -> &SearnConfig {
        &self.config
    }

    /// Process sequences until the source is exhausted.
    ///
    /// Fails with [`SearnError::NoExamples`] when the source yields nothing
    /// at all.
    pub fn run<S: ExampleSource>(&mut self, source: S) -> Result<RunSummary> {
        let seq = &self.config.sequence;
        info!(
            classes = seq.num_classes,
            history = seq.history,
            features = seq.features,
            rollout = seq.rollout,
            beta = seq.beta,
            gamma = seq.gamma,
            passes = self.config.learner.passes,
            policies = self.config.policy_budget(),
            "Starting sequence run"
        );

        let mut reader = SequenceReader::new(source, seq.ring_size);
        let mut reporter = ProgressReporter::new(&self.config.report, self.ctx.started_at());

        loop {
            let outcome =
                self.trainer
                    .process_next_sequence(&mut self.ctx, &mut reader, &mut reporter)?;
            if outcome == SequenceOutcome::Exhausted && reader.read() == 0 {
                return Err(SearnError::NoExamples);
            }
            if outcome == SequenceOutcome::Exhausted || reader.is_exhausted() {
                break;
            }
        }

        let summary = self.ctx.summary();
        info!(
            read = reader.read(),
            released = reader.released(),
            sequences = summary.stats.sequences,
            trained = summary.stats.sequences_trained,
            tested = summary.stats.sequences_tested,
            skipped = summary.stats.sequences_skipped,
            emitted = summary.stats.examples_emitted,
            average_loss = summary.average_loss,
            policies = summary.policies,
            "Run finished"
        );
        Ok(summary)
    }

    pub fn learner(&self) -> &L {
        self.trainer.learner()
    }

    /// Predictions made for the most recent sequence.
    pub fn last_predictions(&self) -> &[u32] {
        self.trainer.predictions()
    }

    /// Consume the driver, returning the learner and the final run summary.
    pub fn finish(self) -> (L, RunSummary) {
        let summary = self.ctx.finalize();
        (self.trainer.into_learner(), summary)
    }
}
