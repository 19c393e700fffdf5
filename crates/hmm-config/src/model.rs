//! Model definition file types.
//!
//! A definition lists the state, action, and perception spaces and the
//! nonzero entries of the prior, transition, and sensor tables. Entries that
//! are not listed are zero.

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Complete model definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDefinition {
    pub schema_version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Hidden states, in order.
    pub states: Vec<String>,

    /// Observable perceptions.
    pub perceptions: Vec<String>,

    /// Named actions. Empty means the model only waits.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Whether the no-op action is available. Defaults to true when there
    /// are no named actions and false otherwise.
    #[serde(default)]
    pub include_wait: Option<bool>,

    /// Prior mass per state. Missing means uniform.
    #[serde(default)]
    pub prior: Option<BTreeMap<String, f64>>,

    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,

    #[serde(default)]
    pub sensor: Vec<SensorEntry>,
}

/// One transition table entry: P(to | from, action).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionEntry {
    pub from: String,

    /// Named action; absent means the no-op action.
    #[serde(default)]
    pub action: Option<String>,

    pub to: String,
    pub probability: f64,
}

/// One sensor table entry: P(perception | state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SensorEntry {
    pub state: String,
    pub perception: String,
    pub probability: f64,
}

/// On-disk format of a definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Toml,
    Yaml,
}

impl ModelFormat {
    /// Pick the format from the file extension. Unknown extensions are JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => ModelFormat::Toml,
            Some("yaml") | Some("yml") => ModelFormat::Yaml,
            _ => ModelFormat::Json,
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFormat::Json => write!(f, "JSON"),
            ModelFormat::Toml => write!(f, "TOML"),
            ModelFormat::Yaml => write!(f, "YAML"),
        }
    }
}

impl ModelDefinition {
    /// Load a definition from a file, picking the format by extension.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content, ModelFormat::from_path(path))
    }

    /// Parse a definition from text in the given format.
    pub fn parse(content: &str, format: ModelFormat) -> Result<Self, ValidationError> {
        let parsed = match format {
            ModelFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ModelFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ModelFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| ValidationError::ParseError(format!("Invalid {}: {}", format, e)))
    }

    /// Parse a definition from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        Self::parse(json, ModelFormat::Json)
    }

    /// Whether the no-op action is part of the action space.
    pub fn has_wait_action(&self) -> bool {
        self.include_wait.unwrap_or(self.actions.is_empty())
    }

    /// Display name for reports.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// JSON schema of the definition format.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ModelDefinition)
    }
}
