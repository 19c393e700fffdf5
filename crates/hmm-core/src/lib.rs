//! HMM Belief Filter Core Library
//!
//! This library provides the filtering engine and its driver plumbing:
//! - The discrete hidden Markov model and its predict/update recursion
//! - Step scripts and belief traces
//! - A mutex-guarded shared model for concurrent callers
//! - Model construction from a definition file
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod loader;
pub mod logging;
pub mod model;
pub mod shared;
pub mod trace;

pub use exit_codes::ExitCode;
pub use loader::build_model;
pub use model::{HiddenMarkovModel, MalformedRow, TableKind, TransitionKey};
pub use shared::SharedModel;
pub use trace::{parse_script, run_script, FilterTrace, Step, StepRecord};
