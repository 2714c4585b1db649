//! Error types for the Searn library.

use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, SearnError>;

/// Errors that can occur while configuring or running Searn.
#[derive(Error, Debug)]
pub enum SearnError {
    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A line of example data could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The inject/remove nesting discipline on an example was broken.
    #[error("history namespace misuse: {0}")]
    HistoryNamespace(String),

    /// The learner was handed an example without a cost-sensitive label.
    #[error("example has no cost-sensitive label")]
    MissingCosts,

    /// The very first read produced no example at all.
    #[error("no example data available")]
    NoExamples,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
