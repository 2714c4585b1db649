//! Linear cost-sensitive one-against-all learner over a hashed weight table.
//!
//! Every class `c` owns the block of the table starting at
//! `(c - 1) * (length / k) * stride`; a class score is the dot product of the
//! example's features with that block. Prediction is the class with the
//! lowest predicted cost, and learning regresses each class score towards
//! its cost with a normalized squared-loss step.

use anyhow::Result;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::SearnError;
use crate::example::Example;

use super::traits::{CostSensitiveLearner, TableLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearCsoaa {
    num_classes: usize,
    layout: TableLayout,
    learning_rate: f32,
    weights: Vec<f32>,
    /// Number of cost-sensitive updates applied so far.
    #[serde(default)]
    updates: u64,
}

impl LinearCsoaa {
    pub fn new(num_classes: usize, layout: TableLayout, learning_rate: f32) -> Self {
        let size = layout.length() * layout.stride as usize;
        Self {
            num_classes: num_classes.max(1),
            layout,
            learning_rate,
            weights: vec![0.0; size],
            updates: 0,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of weights that have moved away from zero.
    pub fn nonzero_weights(&self) -> usize {
        self.weights.iter().filter(|w| **w != 0.0).count()
    }

    fn class_offset(&self, class: usize) -> u32 {
        let block = self.layout.length() / self.num_classes;
        ((class - 1) * block * self.layout.stride as usize) as u32
    }

    fn slot(&self, weight_index: u32, offset: u32) -> usize {
        (weight_index.wrapping_add(offset) & self.layout.weight_mask()) as usize
    }

    /// Predicted cost of `class` (1-based) for the example.
    pub fn score(&self, example: &Example, class: usize) -> f32 {
        let offset = self.class_offset(class);
        example
            .features()
            .map(|f| f.value * self.weights[self.slot(f.weight_index, offset)])
            .sum()
    }

    /// Reject a deserialized learner whose shape would make scoring panic
    /// or address the wrong weights.
    pub fn validate(&self) -> Result<()> {
        if !(1..=30).contains(&self.layout.bits) {
            anyhow::bail!("learner bits must be in 1..=30, got {}", self.layout.bits);
        }
        if self.layout.stride == 0 {
            anyhow::bail!("learner stride must be at least 1");
        }
        if self.num_classes == 0 || self.num_classes > self.layout.length() {
            anyhow::bail!(
                "learner has {} classes, table of {} slots needs 1..={}",
                self.num_classes,
                self.layout.length(),
                self.layout.length()
            );
        }
        let expected = self.layout.length() * self.layout.stride as usize;
        if self.weights.len() != expected {
            anyhow::bail!(
                "learner weight table has {} entries, layout expects {expected}",
                self.weights.len()
            );
        }
        Ok(())
    }
}

impl CostSensitiveLearner for LinearCsoaa {
    fn layout(&self) -> TableLayout {
        self.layout
    }

    fn predict(&mut self, example: &Example) -> u32 {
        (1..=self.num_classes)
            .min_by_key(|&class| OrderedFloat(self.score(example, class)))
            .unwrap_or(1) as u32
    }

    fn learn(&mut self, example: &Example) -> crate::error::Result<()> {
        let costs = example.label.costs().ok_or(SearnError::MissingCosts)?;
        let norm = example.total_sum_feat_sq();
        if norm <= 0.0 {
            return Ok(());
        }
        let eta = self.learning_rate / norm;

        for (i, &cost) in costs.iter().enumerate().take(self.num_classes) {
            let class = i + 1;
            let step = eta * (cost - self.score(example, class));
            if step == 0.0 {
                continue;
            }
            let offset = self.class_offset(class);
            for feature in example.features() {
                let slot = self.slot(feature.weight_index, offset);
                self.weights[slot] += step * feature.value;
            }
        }
        self.updates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::{CostSensitiveLabel, Feature, Label, MulticlassLabel};

    fn example(indices: &[u32]) -> Example {
        let mut ex = Example::new(MulticlassLabel::new(1, 1.0));
        let ns = ex.namespace_entry(b'a');
        for &i in indices {
            ns.push(Feature::new(i, 1.0));
        }
        ex
    }

    fn with_costs(mut ex: Example, costs: &[f32]) -> Example {
        ex.label = Label::Costs(CostSensitiveLabel {
            costs: costs.to_vec(),
        });
        ex
    }

    #[test]
    fn test_untrained_predicts_first_class() {
        let mut learner = LinearCsoaa::new(3, TableLayout::new(10), 0.5);
        assert_eq!(learner.predict(&example(&[1, 2, 3])), 1);
    }

    #[test]
    fn test_learns_cheapest_class() {
        let mut learner = LinearCsoaa::new(3, TableLayout::new(10), 0.5);
        let ex = with_costs(example(&[4, 9]), &[1.0, 1.0, 0.0]);
        for _ in 0..20 {
            learner.learn(&ex).unwrap();
        }
        assert_eq!(learner.predict(&ex), 3);
        assert_eq!(learner.updates(), 20);
        assert!(learner.score(&ex, 1) > learner.score(&ex, 3));
    }

    #[test]
    fn test_learn_requires_costs() {
        let mut learner = LinearCsoaa::new(2, TableLayout::new(8), 0.5);
        let err = learner.learn(&example(&[1])).unwrap_err();
        assert!(matches!(err, SearnError::MissingCosts));
    }

    #[test]
    fn test_class_blocks_are_disjoint() {
        let learner = LinearCsoaa::new(4, TableLayout::new(8), 0.5);
        let offsets: Vec<u32> = (1..=4).map(|c| learner.class_offset(c)).collect();
        assert_eq!(offsets, vec![0, 64, 128, 192]);
    }

    #[test]
    fn test_fresh_learner_is_valid() {
        LinearCsoaa::new(3, TableLayout::new(10), 0.5).validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_broken_shapes() {
        let good = LinearCsoaa::new(2, TableLayout::new(6), 0.5);

        let mut no_classes = good.clone();
        no_classes.num_classes = 0;
        assert!(no_classes.validate().is_err());

        let mut wide = good.clone();
        wide.layout.bits = 64;
        assert!(wide.validate().is_err());

        let mut short = good.clone();
        short.weights.pop();
        assert!(short.validate().is_err());

        let mut flat = good;
        flat.layout.stride = 0;
        assert!(flat.validate().is_err());
    }
}
