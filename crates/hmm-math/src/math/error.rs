//! Error types for distribution and table operations.

use thiserror::Error;

/// Which key set of a distribution or table a key was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Outcomes of a distribution.
    Outcome,
    /// Row keys of a conditional table.
    Row,
    /// Column keys of a conditional table.
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Outcome => write!(f, "outcome"),
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Errors raised by [`Distribution`](crate::Distribution) and
/// [`ConditionalTable`](crate::ConditionalTable).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbabilityError {
    #[error("unknown {axis} key '{key}'")]
    UnknownKey { axis: Axis, key: String },

    #[error("duplicate {axis} key '{key}'")]
    DuplicateKey { axis: Axis, key: String },

    #[error("cannot normalize degenerate distribution (total mass {total})")]
    Degenerate { total: f64 },

    #[error("mass vector has {actual} entries, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Result type for distribution and table operations.
pub type Result<T> = std::result::Result<T, ProbabilityError>;
