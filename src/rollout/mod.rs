//! Rollout bookkeeping for cost estimation.
//!
//! - [`cache::RolloutCache`] -- the `k` candidate histories for one position,
//!   with duplicate detection for shared-history pruning.
//! - [`costs`] -- step losses, cost normalization and rollout horizons.

pub mod cache;
pub mod costs;

pub use cache::{history_hash, HistoryItem, RolloutCache};
pub use costs::{rollout_horizon, shift_to_zero_min, step_loss};
