//! Where examples come from.
//!
//! Every source implements [`ExampleSource`] so the sequence reader can pull
//! from it uniformly. [`ReplaySource`] holds parsed data in memory and replays
//! it once per pass; [`StreamSource`] makes a single pass over a reader.

use std::io::BufRead;

use tracing::{debug, error, info, warn};

use crate::error::Result;

use super::parser::ExampleParser;
use super::types::Example;

/// A blocking, pull-based supply of examples.
pub trait ExampleSource {
    /// The next example, or `None` once the data is exhausted.
    fn next_example(&mut self) -> Option<Example>;

    /// Hand a finished example back.
    fn release(&mut self, example: Example) {
        drop(example);
    }
}

// ---------------------------------------------------------------------------
// ReplaySource
// ---------------------------------------------------------------------------

/// Parsed examples kept in memory and replayed `passes` times.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    examples: Vec<Example>,
    passes: u64,
    pass: u64,
    cursor: usize,
    counter: u64,
}

impl ReplaySource {
    pub fn new(examples: Vec<Example>, passes: usize) -> Self {
        Self {
            examples,
            passes: passes.max(1) as u64,
            pass: 0,
            cursor: 0,
            counter: 0,
        }
    }

    /// Parse every line of `reader`. Malformed lines are skipped with a warning.
    pub fn from_reader(reader: impl BufRead, parser: &ExampleParser, passes: usize) -> Result<Self> {
        let mut examples = Vec::new();
        let mut skipped = 0usize;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            match parser.parse_line(&line, i + 1) {
                Ok(example) => examples.push(example),
                Err(err) => {
                    warn!(error = %err, "skipping malformed example");
                    skipped += 1;
                }
            }
        }
        info!(examples = examples.len(), skipped, passes, "Loaded example data");
        Ok(Self::new(examples, passes))
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

impl ExampleSource for ReplaySource {
    fn next_example(&mut self) -> Option<Example> {
        if self.cursor >= self.examples.len() {
            if self.examples.is_empty() || self.pass + 1 >= self.passes {
                return None;
            }
            self.pass += 1;
            self.cursor = 0;
            debug!(pass = self.pass, "starting pass");
        }
        let mut example = self.examples[self.cursor].clone();
        self.cursor += 1;
        example.pass = self.pass;
        example.example_counter = self.counter;
        self.counter += 1;
        Some(example)
    }
}

// ---------------------------------------------------------------------------
// StreamSource
// ---------------------------------------------------------------------------

/// Parses examples lazily from a reader; a single pass.
pub struct StreamSource<R> {
    reader: R,
    parser: ExampleParser,
    line: String,
    line_no: usize,
    counter: u64,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R, parser: ExampleParser) -> Self {
        Self {
            reader,
            parser,
            line: String::new(),
            line_no: 0,
            counter: 0,
        }
    }
}

impl<R: BufRead> ExampleSource for StreamSource<R> {
    fn next_example(&mut self) -> Option<Example> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, line = self.line_no + 1, "failed to read example data");
                    return None;
                }
            }
            self.line_no += 1;

            match self.parser.parse_line(self.line.trim_end_matches(['\n', '\r']), self.line_no) {
                Ok(mut example) => {
                    example.example_counter = self.counter;
                    self.counter += 1;
                    return Some(example);
                }
                Err(err) => warn!(error = %err, "skipping malformed example"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AnySource: enum dispatch over the concrete sources
// ---------------------------------------------------------------------------

/// Runtime choice of source without boxing.
pub enum AnySource<R> {
    Replay(ReplaySource),
    Stream(StreamSource<R>),
}

impl<R: BufRead> ExampleSource for AnySource<R> {
    fn next_example(&mut self) -> Option<Example> {
        match self {
            Self::Replay(s) => s.next_example(),
            Self::Stream(s) => s.next_example(),
        }
    }

    fn release(&mut self, example: Example) {
        match self {
            Self::Replay(s) => s.release(example),
            Self::Stream(s) => s.release(example),
        }
    }
}
