/// Error types for table parsing and posterior computation.
///
/// Every variant carries the offending identifier or value so a caller can
/// report it without re-deriving context.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, H0Error>;

/// Errors raised while parsing a likelihood table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("likelihood table is empty")]
    Empty,

    #[error("no `{expected}` column in header (found: {found:?})")]
    MissingGridColumn { expected: String, found: Vec<String> },

    #[error("header has no likelihood columns besides `{grid}`")]
    NoEventColumns { grid: String },

    #[error("duplicate column `{name}` in header")]
    DuplicateColumn { name: String },

    /// `line` is 1-based.
    #[error("line {line}: expected {expected} fields, got {got}")]
    RaggedRow { line: usize, expected: usize, got: usize },

    #[error("line {line}, column `{column}`: invalid number '{value}'")]
    InvalidValue { line: usize, column: String, value: String },

    #[error("line {line}: malformed CSV: {message}")]
    Malformed { line: usize, message: String },
}

/// Errors raised by the posterior pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum H0Error {
    #[error("unknown event `{event}` (available: {available:?})")]
    UnknownEvent { event: String, available: Vec<String> },

    #[error("no events selected")]
    EmptySelection,

    #[error("unknown prior '{value}' (expected \"uniform\" or \"log\")")]
    InvalidPrior { value: String },

    #[error("event `{event}` has non-positive likelihood {value} at H0 = {h0} (grid index {index})")]
    NonPositiveLikelihood { event: String, index: usize, h0: f64, value: f64 },

    #[error("posterior is degenerate: {reason}")]
    DegeneratePosterior { reason: String },

    #[error("credible level must lie strictly between 0 and 1, got {level}")]
    InvalidLevel { level: f64 },

    #[error("invalid H0 grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("`{name}` has {got} values but the grid has {expected}")]
    LengthMismatch { name: String, expected: usize, got: usize },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl H0Error {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        H0Error::DegeneratePosterior { reason: reason.into() }
    }

    pub(crate) fn invalid_grid(reason: impl Into<String>) -> Self {
        H0Error::InvalidGrid { reason: reason.into() }
    }
}
