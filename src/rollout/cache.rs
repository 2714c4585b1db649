//! Candidate histories for one position's rollouts.
//!
//! Each of the `k` candidates asserts a different label at the current
//! position and then rolls forward. Candidates whose histories coincide
//! would make identical predictions from then on, so the trainer sorts them
//! by an ordering key and lets duplicates reuse their sibling's work.

use std::cmp::Ordering;

use crate::history::{History, QUADRATIC_CONSTANT};

/// One rollout candidate.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub history: History,
    /// Rolling hash of `history`'s slots.
    pub hash: u32,
    /// Accumulated discounted loss.
    pub loss: f32,
    /// Candidate id; the asserted label is `index + 1`.
    pub index: usize,
    /// Set when this item's key equals its predecessor's after sorting.
    pub duplicate: bool,
}

impl HistoryItem {
    fn new(index: usize, length: usize) -> Self {
        Self {
            history: History::new(length),
            hash: 0,
            loss: 0.0,
            index,
            duplicate: false,
        }
    }

    pub fn label(&self) -> u32 {
        self.index as u32 + 1
    }

    /// Append `label` and update the hash in place. `pow` is `Q^L`.
    pub fn push(&mut self, label: u32, pow: u32) {
        if self.history.is_empty() {
            return;
        }
        let oldest = self.history.back(self.history.len());
        self.hash = self
            .hash
            .wrapping_sub(oldest.wrapping_mul(pow))
            .wrapping_add(label)
            .wrapping_mul(QUADRATIC_CONSTANT);
        self.history.append(label);
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.history.recent_first().cmp(other.history.recent_first()))
    }
}

/// `sum slot_j * Q^(L-j)` over the window, oldest slot first.
pub fn history_hash(history: &History) -> u32 {
    history
        .slots()
        .iter()
        .fold(0u32, |h, &s| h.wrapping_add(s).wrapping_mul(QUADRATIC_CONSTANT))
}

#[derive(Debug, Clone)]
pub struct RolloutCache {
    items: Vec<HistoryItem>,
    pow: u32,
}

impl RolloutCache {
    pub fn new(num_classes: usize, history_length: usize) -> Self {
        let pow = (0..history_length).fold(1u32, |p, _| p.wrapping_mul(QUADRATIC_CONSTANT));
        Self {
            items: (0..num_classes).map(|i| HistoryItem::new(i, history_length)).collect(),
            pow,
        }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [HistoryItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Multiplier that removes the oldest slot from a hash.
    pub fn pow(&self) -> u32 {
        self.pow
    }

    /// Reset every candidate from `base`: candidate `i` asserts label `i + 1`
    /// and starts with loss `weight` unless that label is `truth`.
    pub fn seed(&mut self, base: &History, weight: f32, truth: u32) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.index = i;
            item.history.copy_from(base);
            item.history.append(i as u32 + 1);
            item.hash = history_hash(&item.history);
            item.loss = if item.label() == truth { 0.0 } else { weight };
            item.duplicate = false;
        }
    }

    /// Stable sort by (hash, slots most-recent-first) and flag every item
    /// whose key equals its predecessor's.
    pub fn sort_and_mark_duplicates(&mut self) {
        self.items.sort_by(HistoryItem::key_cmp);
        if let Some(first) = self.items.first_mut() {
            first.duplicate = false;
        }
        for i in 1..self.items.len() {
            let duplicate = self.items[i].key_cmp(&self.items[i - 1]) == Ordering::Equal;
            self.items[i].duplicate = duplicate;
        }
    }

    /// True when every item after the first is a duplicate.
    pub fn all_duplicate(&self) -> bool {
        self.items.iter().skip(1).all(|item| item.duplicate)
    }

    /// Give item `target` the history and hash of item `source`.
    pub fn copy_from(&mut self, target: usize, source: usize) {
        if target == source {
            return;
        }
        let (src, dst) = if source < target {
            let (head, tail) = self.items.split_at_mut(target);
            (&head[source], &mut tail[0])
        } else {
            let (head, tail) = self.items.split_at_mut(source);
            (&tail[0], &mut head[target])
        };
        dst.history.copy_from(&src.history);
        dst.hash = src.hash;
    }

    /// Write each candidate's loss minus the minimum loss into `out`,
    /// indexed by candidate id.
    pub fn write_costs(&self, out: &mut Vec<f32>) {
        out.clear();
        out.resize(self.items.len(), 0.0);
        for item in &self.items {
            out[item.index] = item.loss;
        }
        super::costs::shift_to_zero_min(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn history(slots: &[u32]) -> History {
        let mut h = History::new(slots.len());
        for &s in slots {
            h.append(s);
        }
        h
    }

    #[test]
    fn test_seed_assigns_labels_and_losses() {
        let mut cache = RolloutCache::new(3, 2);
        cache.seed(&history(&[1, 2]), 2.0, 3);
        let labels: Vec<u32> = cache.items().iter().map(|i| i.history.last()).collect();
        assert_eq!(labels, vec![1, 2, 3]);
        let losses: Vec<f32> = cache.items().iter().map(|i| i.loss).collect();
        assert_eq!(losses, vec![2.0, 2.0, 0.0]);
        assert_eq!(cache.items()[0].history.slots(), &[2, 1]);
    }

    #[test]
    fn test_duplicates_detected_after_convergence() {
        let mut cache = RolloutCache::new(3, 1);
        cache.seed(&history(&[0]), 1.0, 1);
        cache.sort_and_mark_duplicates();
        assert!(cache.items().iter().all(|i| !i.duplicate));

        let pow = cache.pow();
        for item in cache.items_mut() {
            item.push(2, pow);
        }
        cache.sort_and_mark_duplicates();
        assert!(cache.all_duplicate());
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut cache = RolloutCache::new(3, 1);
        cache.seed(&history(&[0]), 1.0, 1);
        let pow = cache.pow();
        for item in cache.items_mut() {
            item.push(1, pow);
        }
        cache.sort_and_mark_duplicates();
        let order: Vec<usize> = cache.items().iter().map(|i| i.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_copy_from_both_directions() {
        let mut cache = RolloutCache::new(3, 2);
        cache.seed(&history(&[0, 0]), 1.0, 1);
        cache.copy_from(2, 0);
        assert_eq!(cache.items()[2].history, cache.items()[0].history);
        assert_eq!(cache.items()[2].hash, cache.items()[0].hash);
        cache.copy_from(0, 1);
        assert_eq!(cache.items()[0].history.slots(), &[0, 2]);
        // losses are not copied
        assert_eq!(cache.items()[0].loss, 0.0);
        assert_eq!(cache.items()[2].loss, 1.0);
    }

    #[test]
    fn test_write_costs_by_candidate_id() {
        let mut cache = RolloutCache::new(3, 1);
        cache.seed(&history(&[0]), 1.0, 2);
        cache.items_mut()[0].loss = 1.5;
        cache.items_mut().reverse();
        let mut costs = Vec::new();
        cache.write_costs(&mut costs);
        assert_eq!(costs, vec![1.5, 0.0, 1.0]);
    }

    #[test]
    fn test_zero_length_history_hash_stays_zero() {
        let mut cache = RolloutCache::new(2, 0);
        cache.seed(&History::new(0), 1.0, 1);
        let pow = cache.pow();
        cache.items_mut()[0].push(2, pow);
        assert_eq!(cache.items()[0].hash, 0);
        cache.sort_and_mark_duplicates();
        assert!(cache.all_duplicate());
    }

    proptest! {
        #[test]
        fn rolling_hash_matches_recomputed(
            start in proptest::collection::vec(0u32..8, 1..5),
            labels in proptest::collection::vec(0u32..8, 0..12),
        ) {
            let mut cache = RolloutCache::new(1, start.len());
            cache.seed(&history(&start), 0.0, 1);
            let pow = cache.pow();
            for label in labels {
                cache.items_mut()[0].push(label, pow);
                let item = &cache.items()[0];
                prop_assert_eq!(item.hash, history_hash(&item.history));
            }
        }
    }
}
