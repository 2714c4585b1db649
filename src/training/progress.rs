//! Progress reporting at doubling intervals of weighted examples.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ReportConfig;

use super::context::RunStats;

/// Maximum width of the label prefixes shown in a progress line.
pub const PREFIX_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub struct ProgressReporter {
    every_sequence: bool,
    quiet: bool,
    dump_interval: f64,
    old_weighted_examples: f64,
    old_sum_loss: f64,
    started_at: DateTime<Utc>,
}

impl ProgressReporter {
    pub fn new(config: &ReportConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            every_sequence: config.every_sequence,
            quiet: config.quiet,
            dump_interval: config.initial_interval,
            old_weighted_examples: 0.0,
            old_sum_loss: 0.0,
            started_at,
        }
    }

    /// Whether the next call to `report` would print.
    pub fn is_due(&self, stats: &RunStats) -> bool {
        !self.quiet && (self.every_sequence || stats.weighted_examples > self.dump_interval)
    }

    /// Log one progress line for the sequence just processed, if due.
    ///
    /// Returns true when a line was emitted.
    pub fn report(
        &mut self,
        stats: &RunStats,
        num_classes: usize,
        truths: &[u32],
        predictions: &[u32],
        sequence_features: usize,
    ) -> bool {
        if !self.is_due(stats) {
            return false;
        }

        let since_weight = stats.weighted_examples - self.old_weighted_examples;
        let since_last = if since_weight > 0.0 {
            (stats.sum_loss - self.old_sum_loss) / since_weight
        } else {
            0.0
        };
        let elapsed = (Utc::now() - self.started_at).num_seconds();

        info!(
            average_loss = stats.average_loss(),
            since_last,
            sequence = stats.sequences,
            weight = stats.weighted_examples,
            labels = %format_label_prefix(truths, num_classes),
            predicted = %format_label_prefix(predictions, num_classes),
            features = sequence_features,
            elapsed_s = elapsed,
            "progress"
        );

        self.old_weighted_examples = stats.weighted_examples;
        self.old_sum_loss = stats.sum_loss;
        self.dump_interval *= 2.0;
        true
    }
}

/// Right-align each label to the width of `k` and join them, keeping only
/// as many whole labels as fit in [`PREFIX_WIDTH`] characters.
pub fn format_label_prefix(labels: &[u32], num_classes: usize) -> String {
    let width = num_classes.max(1).to_string().len();
    let mut out = String::new();
    for label in labels {
        let needed = if out.is_empty() { width } else { width + 1 };
        if out.len() + needed > PREFIX_WIDTH {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{label:>width$}"));
    }
    out
}
