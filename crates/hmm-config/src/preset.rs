//! Built-in model presets.
//!
//! - Umbrella: two weather states observed through an umbrella, time only
//! - Door: a door that can be pushed open, observed through a noisy sensor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{ModelDefinition, SensorEntry, TransitionEntry};

/// Available presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Sunny/Rainy weather with an umbrella sensor and no actions.
    Umbrella,
    /// Open/Closed door with `push` and wait actions.
    Door,
}

impl PresetName {
    pub const ALL: &'static [PresetName] = &[PresetName::Umbrella, PresetName::Door];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Umbrella => "umbrella",
            PresetName::Door => "door",
        }
    }

    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "umbrella" | "weather" => Some(PresetName::Umbrella),
            "door" => Some(PresetName::Door),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Umbrella => {
                "Sunny/Rainy weather observed through whether the director carries an umbrella"
            }
            PresetName::Door => "A door that can be pushed open, observed through a noisy sensor",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => write!(
                f,
                "Unknown preset '{}'. Available: {}",
                name,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for PresetError {}

/// Build the definition for a preset.
pub fn get_preset(name: PresetName) -> ModelDefinition {
    match name {
        PresetName::Umbrella => umbrella_preset(),
        PresetName::Door => door_preset(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn t(from: &str, action: Option<&str>, to: &str, probability: f64) -> TransitionEntry {
    TransitionEntry {
        from: from.to_string(),
        action: action.map(str::to_string),
        to: to.to_string(),
        probability,
    }
}

fn s(state: &str, perception: &str, probability: f64) -> SensorEntry {
    SensorEntry {
        state: state.to_string(),
        perception: perception.to_string(),
        probability,
    }
}

fn umbrella_preset() -> ModelDefinition {
    ModelDefinition {
        schema_version: crate::MODEL_SCHEMA_VERSION.to_string(),
        name: Some("umbrella".to_string()),
        description: Some(PresetName::Umbrella.description().to_string()),
        states: strings(&["Sunny", "Rainy"]),
        perceptions: strings(&["Umbrella", "NoUmbrella"]),
        actions: Vec::new(),
        include_wait: None,
        prior: Some(BTreeMap::from([
            ("Sunny".to_string(), 0.5),
            ("Rainy".to_string(), 0.5),
        ])),
        transitions: vec![
            t("Sunny", None, "Sunny", 0.7),
            t("Sunny", None, "Rainy", 0.3),
            t("Rainy", None, "Sunny", 0.3),
            t("Rainy", None, "Rainy", 0.7),
        ],
        sensor: vec![
            s("Sunny", "Umbrella", 0.1),
            s("Sunny", "NoUmbrella", 0.9),
            s("Rainy", "Umbrella", 0.8),
            s("Rainy", "NoUmbrella", 0.2),
        ],
    }
}

fn door_preset() -> ModelDefinition {
    ModelDefinition {
        schema_version: crate::MODEL_SCHEMA_VERSION.to_string(),
        name: Some("door".to_string()),
        description: Some(PresetName::Door.description().to_string()),
        states: strings(&["Open", "Closed"]),
        perceptions: strings(&["SenseOpen", "SenseClosed"]),
        actions: strings(&["push"]),
        include_wait: Some(true),
        prior: Some(BTreeMap::from([
            ("Open".to_string(), 0.5),
            ("Closed".to_string(), 0.5),
        ])),
        transitions: vec![
            t("Open", Some("push"), "Open", 1.0),
            t("Closed", Some("push"), "Open", 0.8),
            t("Closed", Some("push"), "Closed", 0.2),
            // Waiting leaves the door as it is.
            t("Open", None, "Open", 1.0),
            t("Closed", None, "Closed", 1.0),
        ],
        sensor: vec![
            s("Open", "SenseOpen", 0.6),
            s("Open", "SenseClosed", 0.4),
            s("Closed", "SenseOpen", 0.2),
            s("Closed", "SenseClosed", 0.8),
        ],
    }
}

/// Summary of a preset for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub states: Vec<String>,
    pub actions: Vec<String>,
    pub perceptions: Vec<String>,
}

impl PresetInfo {
    pub fn from_preset(name: PresetName) -> Self {
        let def = get_preset(name);
        let mut actions = def.actions.clone();
        if def.has_wait_action() {
            actions.push(hmm_common::NO_OP_NAME.to_string());
        }
        PresetInfo {
            name,
            description: name.description().to_string(),
            states: def.states,
            actions,
            perceptions: def.perceptions,
        }
    }
}

/// List all presets.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
