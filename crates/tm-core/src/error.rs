//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Named connection is not configured
    #[error("[E004] Connection '{name}' is not configured. Available: {available}")]
    ConnectionNotFound { name: String, available: String },

    /// E005: Migration file not found
    #[error("[E005] Migration file not found: {path}")]
    MigrationNotFound { path: String },

    /// E006: Failed to parse a migration file
    #[error("[E006] Failed to parse migration {path}: {message}")]
    MigrationParseError { path: String, message: String },

    /// E007: Operation payload does not have the expected shape
    #[error("[E007] Invalid '{operation}' payload: {message}")]
    InvalidPayload { operation: String, message: String },

    /// E008: IO error
    #[error("[E008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E009: IO error with file path context
    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
