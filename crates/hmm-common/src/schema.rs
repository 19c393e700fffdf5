//! Output schema versioning.

/// Version of the JSON payloads printed by the CLI.
pub const SCHEMA_VERSION: &str = "1.0.0";
