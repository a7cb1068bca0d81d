//! Error types for the redaction engine.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while building or running a redaction session.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// The pattern configuration is unusable. Fatal before any redaction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single pattern failed validation.
    #[error("invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    /// Failed to generate the session salt.
    #[error("salt generation failed: {0}")]
    Salt(String),
}

impl RedactionError {
    /// Create an invalid-pattern error.
    pub fn invalid_pattern(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RedactionError::InvalidPattern {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the configuration class (abort before redaction).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RedactionError::Configuration(_) | RedactionError::InvalidPattern { .. }
        )
    }
}
