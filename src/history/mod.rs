//! Prediction history and the features derived from it.
//!
//! - [`window::History`] -- fixed-length window of the most recent predicted
//!   labels.
//! - [`encoder::HistoryEncoder`] -- injects history features into examples and
//!   routes them into a policy's block of the weight table.

pub mod encoder;
pub mod window;

pub use encoder::{HistoryEncoder, DEFAULT_PREDICTION, HISTORY_SALT, QUADRATIC_CONSTANT};
pub use window::History;
