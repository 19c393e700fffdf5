//! Model loading: resolve, read, parse, validate, snapshot.

use std::path::PathBuf;

use crate::model::ModelDefinition;
use crate::preset::{get_preset, PresetName};
use crate::resolve::{resolve_model_path, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_model, ValidationError, ValidationResult};

/// Options for loading a model definition.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Explicit definition path. Takes precedence over everything else.
    pub model_path: Option<PathBuf>,

    /// Built-in preset, used when no explicit path is given.
    pub preset: Option<PresetName>,

    /// Run semantic validation after parsing.
    pub validate: bool,

    /// Tolerance for probability sums.
    pub tolerance: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            model_path: None,
            preset: None,
            validate: true,
            tolerance: crate::DEFAULT_TOLERANCE,
        }
    }
}

/// A parsed definition and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub definition: ModelDefinition,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
    pub snapshot: ConfigSnapshot,
}

/// Load a model definition.
///
/// Order: explicit path → preset → `HMM_MODEL` → `HMM_CONFIG_DIR` → XDG.
pub fn load_model(options: &LoadOptions) -> ValidationResult<LoadedModel> {
    let (definition, source, path, raw) = match (&options.model_path, options.preset) {
        (None, Some(preset)) => {
            let definition = get_preset(preset);
            let raw = serde_json::to_string(&definition)
                .map_err(|e| ValidationError::ParseError(e.to_string()))?;
            (
                definition,
                ConfigSource::Preset(preset.as_str().to_string()),
                None,
                raw,
            )
        }
        (cli_path, _) => {
            let resolved = resolve_model_path(cli_path.as_deref()).ok_or_else(|| {
                ValidationError::NotFound(
                    "pass --model or --preset, or set HMM_MODEL".to_string(),
                )
            })?;
            let raw = std::fs::read_to_string(&resolved.path).map_err(|e| {
                ValidationError::IoError(format!(
                    "Failed to read {}: {}",
                    resolved.path.display(),
                    e
                ))
            })?;
            let format = crate::model::ModelFormat::from_path(&resolved.path);
            let definition = ModelDefinition::parse(&raw, format)?;
            (definition, resolved.source, Some(resolved.path), raw)
        }
    };

    if options.validate {
        validate_model(&definition, options.tolerance)?;
    }

    let snapshot = ConfigSnapshot::new(&definition, &source, path.as_deref(), &raw);
    Ok(LoadedModel {
        definition,
        source,
        path,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_preset() {
        let loaded = load_model(&LoadOptions {
            preset: Some(PresetName::Umbrella),
            ..LoadOptions::default()
        })
        .unwrap();
        assert_eq!(loaded.definition.display_name(), "umbrella");
        assert_eq!(loaded.source, ConfigSource::Preset("umbrella".into()));
        assert!(loaded.path.is_none());
    }

    #[test]
    fn explicit_path_beats_preset() {
        let err = load_model(&LoadOptions {
            model_path: Some(PathBuf::from("/no/such/model.json")),
            preset: Some(PresetName::Door),
            ..LoadOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }
}
