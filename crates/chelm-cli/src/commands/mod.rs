pub mod cases;
pub mod completions;
pub mod digest;
pub mod resolve;
pub mod values;

use chelm_core::ChelmConfig;
use chelm_schema::{parse_meta_file, ChartMeta};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_META_ERROR: u8 = 2;
pub const EXIT_CASE_NOT_FOUND: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_meta(path: &Path) -> Result<ChartMeta, String> {
    parse_meta_file(path).map_err(|e| format!("metadata error: {e}"))
}

/// Load `path` or the default config file, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ChelmConfig, String> {
    let config = match path {
        Some(p) => ChelmConfig::load(p),
        None => ChelmConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;
    Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
}
