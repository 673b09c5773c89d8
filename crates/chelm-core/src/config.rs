use crate::constants::TestConstants;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the configured test registry.
pub const REGISTRY_ENV: &str = "CHELM_TEST_REGISTRY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// User configuration, read from `~/.config/chelm/config.toml`.
///
/// ```toml
/// [test]
/// registry = "cgr.test"
/// repository = "chainguard/test"
/// tag = "v0.0.0"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChelmConfig {
    #[serde(default)]
    pub test: TestConstants,
}

impl ChelmConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load the default config file. A missing file or unset `HOME` yields
    /// the built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides from `lookup`, normally [`std::env::var`].
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(registry) = lookup(REGISTRY_ENV).filter(|r| !r.trim().is_empty()) {
            self.test.registry = registry.trim().to_owned();
        }
        self
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/chelm/config.toml"))
}
