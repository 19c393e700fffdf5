//! Model snapshots for run reports and reproducibility.
//!
//! A snapshot records which model a run used: where it came from, a hash of
//! its exact content, and the size of its spaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::ModelDefinition;
use crate::resolve::ConfigSource;

/// A frozen snapshot of the loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub model_name: String,

    pub schema_version: String,

    /// Source of the definition.
    pub source: String,

    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the raw definition text, hex encoded.
    pub content_hash: String,

    pub state_count: usize,
    pub action_count: usize,
    pub perception_count: usize,
}

impl ConfigSnapshot {
    /// Snapshot a definition loaded from `raw` text.
    pub fn new(
        def: &ModelDefinition,
        source: &ConfigSource,
        path: Option<&std::path::Path>,
        raw: &str,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            model_name: def.display_name().to_string(),
            schema_version: def.schema_version.clone(),
            source: source.to_string(),
            path: path.map(|p| p.display().to_string()),
            content_hash: hash_content(raw),
            state_count: def.states.len(),
            action_count: def.actions.len() + usize::from(def.has_wait_action()),
            perception_count: def.perceptions.len(),
        }
    }

    /// Whether two snapshots describe the same definition content.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.content_hash == other.content_hash
    }

    /// First 12 hex chars of the content hash.
    pub fn short_id(&self) -> &str {
        &self.content_hash[..12.min(self.content_hash.len())]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
