//! Model path resolution.
//!
//! Resolution order: CLI argument → `HMM_MODEL` → `HMM_CONFIG_DIR`/model.json
//! → XDG config dir → none.

use std::path::{Path, PathBuf};

/// Where a model definition came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// A built-in preset.
    Preset(String),

    /// Nothing found.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::Preset(name) => write!(f, "preset '{}'", name),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A resolved model file and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub source: ConfigSource,
}

const ENV_MODEL_PATH: &str = "HMM_MODEL";
const ENV_CONFIG_DIR: &str = "HMM_CONFIG_DIR";

const MODEL_FILENAME: &str = "model.json";

/// Application name for XDG directories.
const APP_NAME: &str = "hmm-filter";

/// Resolve the model definition path.
///
/// An explicit CLI path is returned even when it does not exist, so the
/// caller reports the read failure instead of silently falling back.
pub fn resolve_model_path(cli_path: Option<&Path>) -> Option<ResolvedPath> {
    resolve_with(cli_path, |var| std::env::var(var).ok(), xdg_config_dir())
}

fn resolve_with<F>(
    cli_path: Option<&Path>,
    env: F,
    xdg_dir: Option<PathBuf>,
) -> Option<ResolvedPath>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. CLI argument
    if let Some(path) = cli_path {
        return Some(ResolvedPath {
            path: path.to_path_buf(),
            source: ConfigSource::CliArgument,
        });
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = env(ENV_MODEL_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Some(ResolvedPath {
                path,
                source: ConfigSource::Environment,
            });
        }
    }

    // 3. Environment variable (config dir)
    if let Some(config_dir) = env(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(MODEL_FILENAME);
        if path.exists() {
            return Some(ResolvedPath {
                path,
                source: ConfigSource::Environment,
            });
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_dir {
        let path = dir.join(MODEL_FILENAME);
        if path.exists() {
            return Some(ResolvedPath {
                path,
                source: ConfigSource::XdgConfig,
            });
        }
    }

    None
}

/// XDG config directory for the filter.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
