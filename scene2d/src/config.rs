//! Configuration types for the scene

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Errors that can occur while loading or saving a [`SceneConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for a [`Scene`](crate::scene::Scene)
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Run hierarchy validation before every sync pass
    pub validate_on_sync: bool,
    /// Pre-sized capacity of the tracking map and dirty sets
    pub initial_capacity: usize,
    /// Whether `destroy` rewrites orphaned children so they keep their world
    /// transform
    pub preserve_child_transforms_on_destroy: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            validate_on_sync: false,
            initial_capacity: 64,
            preserve_child_transforms_on_destroy: true,
        }
    }
}

impl SceneConfig {
    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        debug!(config = ?config, "Parsed scene config");
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading scene config");

        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save this config to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!(path = ?path, "Scene config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SceneConfig::default();
        assert!(!config.validate_on_sync);
        assert_eq!(config.initial_capacity, 64);
        assert!(config.preserve_child_transforms_on_destroy);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SceneConfig::from_json_str(r#"{ "validate_on_sync": true }"#).unwrap();
        assert!(config.validate_on_sync);
        assert_eq!(config.initial_capacity, 64);
    }

    #[test]
    fn test_empty_object() {
        let config = SceneConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let result = SceneConfig::from_json_str(r#"{ "initial_capacity": "lots" }"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = SceneConfig::load_from_file("does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
