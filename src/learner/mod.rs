//! The online learner the sequence trainer reduces to.
//!
//! - [`traits::CostSensitiveLearner`] -- train/predict interface over a shared
//!   hashed weight table described by [`traits::TableLayout`].
//! - [`linear::LinearCsoaa`] -- a linear cost-sensitive one-against-all
//!   learner; saved as part of a [`crate::model::SearnModel`].

pub mod linear;
pub mod traits;

pub use linear::LinearCsoaa;
pub use traits::{CostSensitiveLearner, TableLayout};
