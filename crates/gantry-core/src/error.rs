//! Error types for Gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for Gantry core operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Project definition errors
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding or validating a project definition
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The project document could not be parsed
    #[error("Failed to parse project definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A variant or task has an empty name
    #[error("Project has an empty {0} name")]
    EmptyName(&'static str),

    /// Two build variants share a name
    #[error("Duplicate build variant '{0}'")]
    DuplicateVariant(String),

    /// Two tasks share a name
    #[error("Duplicate task '{0}'")]
    DuplicateTask(String),

    /// A build variant lists a task that has no definition
    #[error("Build variant '{variant}' references undefined task '{task}'")]
    UndefinedVariantTask { variant: String, task: String },
}
