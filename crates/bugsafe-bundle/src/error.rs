//! Error types for bundle operations.

use bugsafe_redact::{Finding, RedactionError};
use thiserror::Error;

/// Errors that can occur while writing, reading or extracting a bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry content does not match the manifest
    #[error("integrity check failed for '{entry}': expected {expected}, got {actual}")]
    Integrity {
        entry: String,
        expected: String,
        actual: String,
    },

    /// Entry name would escape the extraction root
    #[error("unsafe entry name: {entry:?}")]
    PathTraversal { entry: String },

    /// Entry larger than the configured read limit
    #[error("entry '{entry}' is {size} bytes (limit {limit})")]
    OversizedEntry { entry: String, size: u64, limit: u64 },

    /// Archive has more entries than allowed
    #[error("archive has {count} entries (limit {limit})")]
    TooManyEntries { count: usize, limit: usize },

    /// Required entry not in bundle
    #[error("missing entry: {0}")]
    MissingEntry(String),

    /// Unknown or unsupported format version
    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Corrupted manifest
    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// Attachment rejected by policy
    #[error("attachment rejected: {0}")]
    Attachment(String),

    /// Bundle exceeds the total size limit
    #[error("bundle is {size} bytes (limit {limit})")]
    BundleTooLarge { size: u64, limit: u64 },

    /// Bundle is empty
    #[error("bundle has no content to write")]
    EmptyBundle,

    /// Entry is not valid UTF-8 where text was expected
    #[error("entry '{entry}' is not UTF-8 text")]
    NotText { entry: String },

    /// Pre-write audit found unredacted secrets
    #[error("self-check found {} unredacted value(s)", findings.len())]
    SelfCheckFailed { findings: Vec<Finding> },

    /// Redaction pipeline error
    #[error(transparent)]
    Redaction(#[from] RedactionError),
}

impl BundleError {
    /// True for errors that indicate a tampered or hostile archive.
    pub fn is_security(&self) -> bool {
        matches!(
            self,
            BundleError::Integrity { .. }
                | BundleError::PathTraversal { .. }
                | BundleError::OversizedEntry { .. }
                | BundleError::TooManyEntries { .. }
                | BundleError::CorruptedManifest(_)
                | BundleError::UnsupportedVersion { .. }
        )
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
