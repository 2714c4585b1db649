//! The learner interface the sequence trainer drives.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::example::Example;

/// Shape of the shared weight table that feature indices address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// log2 of the number of addressable feature slots.
    pub bits: u32,
    /// Weights stored per feature slot.
    pub stride: u32,
}

impl TableLayout {
    pub fn new(bits: u32) -> Self {
        Self { bits, stride: 1 }
    }

    /// Number of addressable feature slots.
    pub fn length(&self) -> usize {
        1usize << self.bits
    }

    /// Mask applied to freshly hashed feature indices.
    pub fn parse_mask(&self) -> u32 {
        (self.length() - 1) as u32
    }

    /// Mask applied when a (possibly offset) index addresses the weight vector.
    pub fn weight_mask(&self) -> u32 {
        (self.length() * self.stride as usize - 1) as u32
    }
}

/// An online cost-sensitive multiclass learner.
///
/// Both operations act on whatever region of the weight table the example's
/// feature indices currently address, which is how the trainer keeps one
/// disjoint parameter block per policy.
pub trait CostSensitiveLearner {
    /// The weight table this learner addresses.
    fn layout(&self) -> TableLayout;

    /// Predict a class in `1..=k` for the example.
    fn predict(&mut self, example: &Example) -> u32;

    /// Update on an example whose label is a cost vector.
    fn learn(&mut self, example: &Example) -> Result<()>;
}
