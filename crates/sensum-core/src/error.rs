//! Error taxonomy.
//!
//! Hard failures exist only at the edges: a source that cannot deliver, or a
//! configuration that cannot be run. Per-tick numeric trouble never surfaces
//! here; it becomes a withheld outcome inside the compute step.

use thiserror::Error;

/// The sample source cannot deliver now or ever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("required hardware is unavailable")]
    Unavailable,
    #[error("permission to read the source was denied")]
    PermissionDenied,
}

/// Why `start()` refused to begin a measurement run.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("sample source failed: {0}")]
    Source(#[from] SourceError),
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("a measurement run is already active")]
    AlreadyRunning,
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for StartError {
    fn from(e: ConfigError) -> Self {
        StartError::ConfigInvalid(e.to_string())
    }
}
