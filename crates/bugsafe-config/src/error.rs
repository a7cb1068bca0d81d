//! Configuration errors.

use crate::resolve::ConfigSource;
use bugsafe_redact::RedactionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },

    #[error("{key} = {value} from {origin} is out of range {min}..={max}")]
    OutOfRange {
        key: String,
        value: i64,
        min: i64,
        max: i64,
        origin: ConfigSource,
    },

    #[error("config file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Redaction(#[from] RedactionError),
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
