//! Examples, their text format and the sources that supply them.
//!
//! - [`types`] -- features, namespaces, labels and the [`Example`] itself.
//! - [`parser`] -- the line-oriented text format.
//! - [`source`] -- in-memory replay and streaming sources behind one trait.

pub mod parser;
pub mod source;
pub mod types;

pub use parser::{ExampleParser, DEFAULT_NAMESPACE};
pub use source::{AnySource, ExampleSource, ReplaySource, StreamSource};
pub use types::{
    CostSensitiveLabel, Example, Feature, Label, MulticlassLabel, Namespace, CONSTANT_FEATURE,
    CONSTANT_NAMESPACE, HISTORY_NAMESPACE,
};
