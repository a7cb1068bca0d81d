//! One configuration layer: a TOML file, the environment or CLI overrides.
//!
//! Every field is optional; a layer only sets what it mentions.

use crate::error::{ConfigError, Result};
use bugsafe_redact::PatternSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Partial configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub redaction: RedactionLayer,
    pub bundle: BundleLayer,
}

/// `[redaction]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact_emails: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact_ips: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact_uuids: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// `[[redaction.custom_patterns]]` tables.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_patterns: Vec<PatternSpec>,
}

/// `[bundle]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entry_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_bytes: Option<u64>,
}

impl ConfigLayer {
    /// Parse TOML text; `path` is only used in errors.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::from_toml(&text, path)?;
        debug!(
            path = %path.display(),
            custom_patterns = layer.redaction.custom_patterns.len(),
            "Loaded config file"
        );
        Ok(layer)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
