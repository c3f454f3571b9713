//! Config file loading
//!
//! Lookup order: `--config <file>`, then `reprise.toml` in the platform
//! config directory if it exists, then built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use directories::ProjectDirs;
use reprise_core::StudyConfig;

/// File name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "reprise.toml";

/// Platform config file location, whether or not it exists
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "reprise", "core").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Parse a config file; `.json` is accepted alongside TOML
pub fn from_file(path: &Path) -> anyhow::Result<StudyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: StudyConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?,
        Some("toml") | None => toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?,
        Some(other) => bail!("Unsupported config format .{}; use .toml or .json", other),
    };
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Resolve and load the effective config, returning where it came from
pub fn load(explicit: Option<&Path>) -> anyhow::Result<(StudyConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((from_file(path)?, Some(path.to_path_buf())));
    }
    if let Some(path) = default_config_path().filter(|p| p.exists()) {
        let config = from_file(&path)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        return Ok((config, Some(path)));
    }
    Ok((StudyConfig::default(), None))
}

/// Render a config as TOML
pub fn to_toml(config: &StudyConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("serializing config")
}
