//! Error types for loading scenes and configuration

use thiserror::Error;

/// Errors that can occur when loading a scene file
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scene TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A layer declared a type this crate does not model
    #[error("unknown layer type '{kind}' for layer '{id}'")]
    UnknownLayerType { id: String, kind: String },

    /// Two layers share an id
    #[error("duplicate layer id '{id}'")]
    DuplicateId { id: String },

    /// The selection names a layer that is not in the scene
    #[error("selected layer '{id}' does not exist")]
    UnknownSelection { id: String },
}

impl SceneError {
    pub fn unknown_type(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownLayerType {
            id: id.into(),
            kind: kind.into(),
        }
    }

    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    pub fn unknown_selection(id: impl Into<String>) -> Self {
        Self::UnknownSelection { id: id.into() }
    }
}

/// Errors that can occur when loading engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("grid size must be positive, got {0}")]
    InvalidGridSize(f64),
}
