//! Fixed-length sliding window over the most recent predictions.

/// The most recent predicted labels, oldest first, newest at the end.
///
/// The window always holds exactly `len()` slots; a slot value of 0 means
/// no prediction has been made there yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    slots: Vec<u32>,
}

impl History {
    pub fn new(length: usize) -> Self {
        Self {
            slots: vec![0; length],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    /// Evict the oldest slot and write `label` at the newest end.
    pub fn append(&mut self, label: u32) {
        if let Some(last) = self.slots.len().checked_sub(1) {
            self.slots.copy_within(1.., 0);
            self.slots[last] = label;
        }
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.slots.fill(0);
    }

    /// Overwrite this window with `other`'s contents (same length).
    pub fn copy_from(&mut self, other: &History) {
        self.slots.copy_from_slice(&other.slots);
    }

    /// The most recent prediction, or 0 for a zero-length window.
    pub fn last(&self) -> u32 {
        self.slots.last().copied().unwrap_or(0)
    }

    /// The slot `offset` steps back from the newest end (`offset = 1` is the
    /// most recent).
    pub fn back(&self, offset: usize) -> u32 {
        self.slots[self.slots.len() - offset]
    }

    /// Iterate the slots most-recent first.
    pub fn recent_first(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().rev().copied()
    }
}
