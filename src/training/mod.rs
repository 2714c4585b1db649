//! Searn training over sequences.
//!
//! This module reduces sequence labeling to cost-sensitive classification:
//! every labeled sequence is read into a ring, each position's candidate
//! labels are scored by rolling out the rest of the sequence, and the
//! resulting cost vectors train the current policy.

pub mod context;
pub mod driver;
pub mod progress;
pub mod reader;
pub mod trainer;

pub use context::{RunStats, RunSummary, SearnContext};
pub use driver::SearnDriver;
pub use progress::{format_label_prefix, ProgressReporter};
pub use reader::SequenceReader;
pub use trainer::{SequenceOutcome, SequenceTrainer};
