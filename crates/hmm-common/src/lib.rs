//! HMM filter common types, identifiers, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Identifier newtypes for states, actions, and perceptions
//! - The distinguished no-op action
//! - The unified error type with stable codes
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{format_error_human, DomainKind, Error, ErrorCategory, Result, StructuredError};
pub use id::{Action, ActionId, PerceptionId, StateId, NO_OP_NAME};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
