//! Configuration file loading
//!
//! Missing files are not an error: each loader falls back to defaults so a
//! bare checkout starts with a useful configuration.

use std::path::Path;

use tracing::debug;

use super::models::{AppConfig, ModelsFile, RoutesFile};
use crate::utils::error::Result;

/// Load the main config file, defaults when absent.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file missing, using defaults");
        return Ok(AppConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Load the routes file, empty when absent.
pub fn load_routes(path: &Path) -> Result<RoutesFile> {
    if !path.exists() {
        return Ok(RoutesFile::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Load the per-model scoring file, empty when absent.
pub fn load_models(path: &Path) -> Result<ModelsFile> {
    if !path.exists() {
        return Ok(ModelsFile::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}
