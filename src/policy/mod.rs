//! Policy mixing for Searn.
//!
//! - [`selector::PolicySelector`] -- seeded stochastic choice among learned
//!   policies and the oracle.
//! - [`schedule::PolicySchedule`] -- when a new policy starts training.

pub mod schedule;
pub mod selector;

pub use schedule::PolicySchedule;
pub use selector::{Policy, PolicySelector};
