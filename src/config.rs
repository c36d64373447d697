//! Configuration for the editing engine

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration options for structural edits
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Grid unit; duplicates are offset by half of it on both axes
    pub grid_size: f64,

    /// Run the order validator on every edit and log what it finds
    pub check_invariants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            check_invariants: false,
        }
    }
}

/// TOML structure for deserializing engine configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    grid_size: Option<f64>,
    check_invariants: Option<bool>,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid unit
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Enable or disable the order validator
    pub fn with_check_invariants(mut self, check: bool) -> Self {
        self.check_invariants = check;
        self
    }

    /// Offset applied to duplicates on both axes
    pub fn duplicate_offset(&self) -> f64 {
        self.grid_size / 2.0
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let grid_size = parsed.grid_size.unwrap_or(defaults.grid_size);
        if grid_size <= 0.0 || !grid_size.is_finite() {
            return Err(ConfigError::InvalidGridSize(grid_size));
        }
        Ok(Self {
            grid_size,
            check_invariants: parsed.check_invariants.unwrap_or(defaults.check_invariants),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.grid_size, 20.0);
        assert!(!config.check_invariants);
        assert_eq!(config.duplicate_offset(), 10.0);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new().with_grid_size(8.0).with_check_invariants(true);
        assert_eq!(config.duplicate_offset(), 4.0);
        assert!(config.check_invariants);
    }

    #[test]
    fn test_from_str_partial() {
        let config = EngineConfig::from_str("check_invariants = true").expect("Should parse config");
        assert_eq!(config.grid_size, 20.0);
        assert!(config.check_invariants);
    }

    #[test]
    fn test_from_str_rejects_bad_input() {
        assert!(matches!(
            EngineConfig::from_str("grid_size = 0.0"),
            Err(ConfigError::InvalidGridSize(_))
        ));
        assert!(matches!(
            EngineConfig::from_str("grid = 4.0"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
