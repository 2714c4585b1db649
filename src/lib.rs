//! Searn: sequence labeling by search-based structured prediction.
//!
//! Reduces sequence labeling to online cost-sensitive multiclass
//! classification. A sequence of learned policies is trained, each on cost
//! vectors estimated by rolling out a mixture of earlier policies and the
//! oracle, with recent predictions fed back as history features.

pub mod config;
pub mod error;
pub mod example;
pub mod history;
pub mod learner;
pub mod model;
pub mod policy;
pub mod rollout;
pub mod training;
