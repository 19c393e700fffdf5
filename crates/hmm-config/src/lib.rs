//! HMM filter model definition loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for model definition files (JSON, TOML, YAML)
//! - Model path resolution (CLI → env → XDG → none)
//! - Semantic validation (ids, ranges, row sums)
//! - Built-in presets
//! - Config snapshots for run reports

pub mod load;
pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use load::{load_model, LoadOptions, LoadedModel};
pub use model::{ModelDefinition, ModelFormat, SensorEntry, TransitionEntry};
pub use preset::{get_preset, list_presets, PresetInfo, PresetName};
pub use resolve::{resolve_model_path, ConfigSource, ResolvedPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{model_issues, validate_model, ValidationError, ValidationResult};

/// Schema version for model definition files.
pub const MODEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default tolerance for probability sums.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
