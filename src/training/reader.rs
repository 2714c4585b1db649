//! Pulls examples for one sequence at a time and keeps the run-level
//! bookkeeping that depends on the raw stream: pass changes, ring capacity
//! and label clamping.

use tracing::{debug, warn};

use crate::example::{Example, ExampleSource};

use super::context::SearnContext;

pub struct SequenceReader<S> {
    source: S,
    capacity: usize,
    read_this_sequence: usize,
    last_pass: u64,
    last_example: u64,
    exhausted: bool,
    read: u64,
    released: u64,
}

impl<S: ExampleSource> SequenceReader<S> {
    pub fn new(source: S, capacity: usize) -> Self {
        Self {
            source,
            capacity: capacity.max(1),
            read_this_sequence: 0,
            last_pass: 0,
            last_example: 0,
            exhausted: false,
            read: 0,
            released: 0,
        }
    }

    /// Reset the per-sequence read count.
    pub fn begin_sequence(&mut self) {
        self.read_this_sequence = 0;
    }

    /// True once the source has returned `None`.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Examples pulled from the source so far, boundaries included.
    pub fn read(&self) -> u64 {
        self.read
    }

    /// Examples handed back so far.
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Next example of the current sequence.
    ///
    /// Returns `None` when the source is exhausted or the sequence has
    /// reached the ring capacity. `allow_cross_boundary` is set while no
    /// sequence is open, so a pass change there is expected.
    pub fn next(&mut self, ctx: &mut SearnContext, allow_cross_boundary: bool) -> Option<Example> {
        if self.read_this_sequence >= self.capacity {
            warn!(
                example = self.last_example,
                capacity = self.capacity,
                "sequence length exceeds ring size; breaking apart"
            );
            return None;
        }

        let Some(mut example) = self.source.next_example() else {
            self.exhausted = true;
            return None;
        };
        self.read_this_sequence += 1;
        self.read += 1;
        self.last_example = example.example_counter;

        if example.pass != self.last_pass {
            self.last_pass = example.pass;
            if !allow_cross_boundary {
                ctx.warn_missing_boundary();
            }
            debug!(pass = example.pass, "pass boundary");
            ctx.schedule.on_pass_boundary();
        }

        let counter = example.example_counter;
        if let Some(label) = example.multiclass_mut() {
            if let Some(class) = label.class {
                label.class = Some(ctx.clamp_label(class, counter));
            }
        }

        Some(example)
    }

    pub fn release(&mut self, example: Example) {
        self.released += 1;
        self.source.release(example);
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
