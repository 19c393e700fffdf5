//! Error types for the HMM filter.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation hints for humans
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "domain",
//!   "message": "unknown perception 'Hat'",
//!   "context": { "kind": "perception", "id": "Hat" }
//! }
//! ```
//!
//! None of these errors are transient. They are programmer or configuration
//! errors and are surfaced to the immediate caller without retry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for HMM filter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which identifier space an unknown or duplicate id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    State,
    Action,
    Perception,
}

impl std::fmt::Display for DomainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainKind::State => write!(f, "state"),
            DomainKind::Action => write!(f, "action"),
            DomainKind::Perception => write!(f, "perception"),
        }
    }
}

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model definition and configuration errors.
    Config,
    /// Identifier outside the model's fixed sets.
    Domain,
    /// Numerical failures during filtering.
    Numerical,
    /// Malformed driver input (step scripts).
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Domain => write!(f, "domain"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the HMM filter.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid model definition: {0}")]
    InvalidModel(String),

    // Domain errors (20-29)
    #[error("unknown {kind} '{id}'")]
    Domain { kind: DomainKind, id: String },

    #[error("cannot normalize degenerate distribution (total mass {total})")]
    DegenerateDistribution { total: f64 },

    #[error("duplicate {kind} '{id}'")]
    DuplicateId { kind: DomainKind, id: String },

    #[error("invalid step '{0}': expected wait, act:<action>, or perceive:<perception>")]
    InvalidStep(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an unknown id.
    pub fn domain(kind: DomainKind, id: impl ToString) -> Self {
        Error::Domain {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Domain, numerical, and input errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidModel(_) => 11,
            Error::Domain { .. } => 20,
            Error::DegenerateDistribution { .. } => 21,
            Error::DuplicateId { .. } => 22,
            Error::InvalidStep(_) => 23,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidModel(_) | Error::DuplicateId { .. } => {
                ErrorCategory::Config
            }
            Error::Domain { .. } => ErrorCategory::Domain,
            Error::DegenerateDistribution { .. } => ErrorCategory::Numerical,
            Error::InvalidStep(_) => ErrorCategory::Input,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check the model path, HMM_MODEL, and HMM_CONFIG_DIR.",
            Error::InvalidModel(_) => {
                "Run 'hmm-core check --model <file>' to list the offending entries."
            }
            Error::Domain { .. } => {
                "Use only states, actions, and perceptions declared in the model definition."
            }
            Error::DegenerateDistribution { .. } => {
                "The observation has zero likelihood under the current belief. Check the sensor model."
            }
            Error::DuplicateId { .. } => "Remove the repeated identifier from the model definition.",
            Error::InvalidStep(_) => "Steps are 'wait', 'act:<action>', or 'perceive:<perception>'.",
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidModel(_) => "Invalid Model Definition",
            Error::Domain { .. } => "Unknown Identifier",
            Error::DegenerateDistribution { .. } => "Degenerate Distribution",
            Error::DuplicateId { .. } => "Duplicate Identifier",
            Error::InvalidStep(_) => "Invalid Step",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Remediation hint.
    pub remediation: String,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::Domain { kind, id } | Error::DuplicateId { kind, id } => {
                context.insert("kind".to_string(), serde_json::json!(kind));
                context.insert("id".to_string(), serde_json::json!(id));
            }
            Error::DegenerateDistribution { total } => {
                context.insert("total".to_string(), serde_json::json!(total));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for a human reader.
pub fn format_error_human(err: &Error) -> String {
    format!(
        "✗ {}\n  Reason: {}\n  Fix: {}",
        err.headline(),
        err,
        err.remediation()
    )
}
