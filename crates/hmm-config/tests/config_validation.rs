//! Definition loading and validation against real files on disk.
//!
//! Covers:
//! - JSON/TOML/YAML definitions through `load_model`
//! - Validation failures surfacing as `ValidationError`
//! - Resolution through `HMM_MODEL` / `HMM_CONFIG_DIR`

use hmm_config::{
    get_preset, load_model, model_issues, LoadOptions, ModelDefinition, PresetName,
    ValidationError, DEFAULT_TOLERANCE,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|k| env::var(k).ok()).collect();
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, val) in self.keys.iter().zip(self.saved.iter()) {
            match val {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|p| p.into_inner());
    f()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn load_path(path: &Path) -> Result<hmm_config::LoadedModel, ValidationError> {
    load_model(&LoadOptions {
        model_path: Some(path.to_path_buf()),
        ..LoadOptions::default()
    })
}

const UMBRELLA_YAML: &str = r#"
schema_version: "1.0.0"
name: weather
states: [Sunny, Rainy]
perceptions: [Umbrella, NoUmbrella]
transitions:
  - { from: Sunny, to: Sunny, probability: 0.7 }
  - { from: Sunny, to: Rainy, probability: 0.3 }
  - { from: Rainy, to: Sunny, probability: 0.3 }
  - { from: Rainy, to: Rainy, probability: 0.7 }
sensor:
  - { state: Sunny, perception: Umbrella, probability: 0.1 }
  - { state: Sunny, perception: NoUmbrella, probability: 0.9 }
  - { state: Rainy, perception: Umbrella, probability: 0.8 }
  - { state: Rainy, perception: NoUmbrella, probability: 0.2 }
"#;

#[test]
fn test_yaml_definition_loads() {
    let temp = TempDir::new().expect("temp dir");
    let path = write(temp.path(), "weather.yaml", UMBRELLA_YAML);
    let loaded = load_path(&path).expect("valid yaml");
    assert_eq!(loaded.definition.display_name(), "weather");
    assert_eq!(loaded.snapshot.state_count, 2);
    assert_eq!(loaded.snapshot.action_count, 1);
    assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_preset_written_as_json_round_trips() {
    let temp = TempDir::new().expect("temp dir");
    let def = get_preset(PresetName::Door);
    let path = write(
        temp.path(),
        "door.json",
        &serde_json::to_string_pretty(&def).unwrap(),
    );
    let loaded = load_path(&path).expect("preset json");
    assert_eq!(loaded.definition, def);
}

#[test]
fn test_toml_definition_loads() {
    let temp = TempDir::new().expect("temp dir");
    let def = get_preset(PresetName::Door);
    let path = write(temp.path(), "door.toml", &toml::to_string(&def).unwrap());
    let loaded = load_path(&path).expect("preset toml");
    assert_eq!(loaded.definition.states, def.states);
    assert_eq!(loaded.definition.transitions.len(), def.transitions.len());
}

#[test]
fn test_bad_row_sum_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let bad = UMBRELLA_YAML.replace("probability: 0.2 }", "probability: 0.3 }");
    let path = write(temp.path(), "bad.yml", &bad);
    let err = load_path(&path).expect_err("row sum should fail");
    assert!(matches!(err, ValidationError::RowSum { ref table, .. } if table == "sensor"));
}

#[test]
fn test_skip_validation_loads_malformed_model() {
    let temp = TempDir::new().expect("temp dir");
    let bad = UMBRELLA_YAML.replace("probability: 0.2 }", "probability: 0.3 }");
    let path = write(temp.path(), "bad.yml", &bad);
    let loaded = load_model(&LoadOptions {
        model_path: Some(path),
        validate: false,
        ..LoadOptions::default()
    })
    .expect("validation skipped");
    assert_eq!(model_issues(&loaded.definition, DEFAULT_TOLERANCE).len(), 1);
}

#[test]
fn test_wrong_schema_version_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let bad = UMBRELLA_YAML.replace("\"1.0.0\"", "\"2.0.0\"");
    let path = write(temp.path(), "v2.yaml", &bad);
    assert!(matches!(
        load_path(&path),
        Err(ValidationError::VersionMismatch { .. })
    ));
}

#[test]
fn test_unknown_reference_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let bad = UMBRELLA_YAML.replace("perception: NoUmbrella, probability: 0.2", "perception: Hat, probability: 0.2");
    let path = write(temp.path(), "hat.yaml", &bad);
    let err = load_path(&path).expect_err("unknown perception");
    assert!(matches!(err, ValidationError::InvalidValue { ref message, .. } if message.contains("Hat")));
}

#[test]
fn test_parse_error_for_garbage() {
    let temp = TempDir::new().expect("temp dir");
    let path = write(temp.path(), "model.json", "{\"states\": [");
    assert!(matches!(load_path(&path), Err(ValidationError::ParseError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().expect("temp dir");
    let err = load_path(&temp.path().join("absent.json")).expect_err("missing file");
    assert!(matches!(err, ValidationError::IoError(_)));
    let converted: hmm_common::Error = err.into();
    assert_eq!(converted.code(), 10);
}

#[test]
fn test_resolve_through_env_model_path() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["HMM_MODEL", "HMM_CONFIG_DIR"]);
        let temp = TempDir::new().expect("temp dir");
        let path = write(temp.path(), "env.yaml", UMBRELLA_YAML);
        env::set_var("HMM_MODEL", path.display().to_string());
        env::remove_var("HMM_CONFIG_DIR");

        let loaded = load_model(&LoadOptions::default()).expect("env model");
        assert_eq!(loaded.source, hmm_config::ConfigSource::Environment);
        assert_eq!(loaded.path, Some(path));
    });
}

#[test]
fn test_resolve_through_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["HMM_MODEL", "HMM_CONFIG_DIR"]);
        let temp = TempDir::new().expect("temp dir");
        let def = get_preset(PresetName::Umbrella);
        write(
            temp.path(),
            "model.json",
            &serde_json::to_string(&def).unwrap(),
        );
        env::remove_var("HMM_MODEL");
        env::set_var("HMM_CONFIG_DIR", temp.path().display().to_string());

        let loaded = load_model(&LoadOptions::default()).expect("config dir model");
        assert_eq!(loaded.definition, def);
    });
}

#[test]
fn test_definition_from_json_str() {
    let def = get_preset(PresetName::Umbrella);
    let json = serde_json::to_string(&def).unwrap();
    assert_eq!(ModelDefinition::from_json_str(&json).unwrap(), def);
}
