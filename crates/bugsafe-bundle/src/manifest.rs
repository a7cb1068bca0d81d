//! Bundle manifest types and serialization.
//!
//! The manifest is the source of truth for a bundle's contents:
//! - format version, creation time and tool version
//! - SHA-256 checksum and size of every other entry
//! - `sha256(salt)` of the redaction session (never the salt itself)
//! - per-category redaction counts

use crate::paths::normalize_entry_name;
use crate::{BundleError, Result};
use bugsafe_redact::RedactionReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Format version written by this crate.
pub const FORMAT_VERSION: &str = "1.0";

/// Format versions this crate can read.
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Manifest file name within the bundle.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Version of the tool that wrote a bundle.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bundle manifest containing metadata and entry checksums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: String,

    pub created_at: DateTime<Utc>,

    pub tool_version: String,

    /// Hex SHA-256 of the session salt.
    pub salt_hash: String,

    /// Entry name to hex SHA-256 of its bytes.
    pub checksums: BTreeMap<String, String>,

    /// Entry name to size in bytes.
    pub sizes: BTreeMap<String, u64>,

    /// Redactions per category.
    #[serde(default)]
    pub redaction_summary: BTreeMap<String, u64>,

    #[serde(default)]
    pub redaction_total: u64,
}

impl BundleManifest {
    /// Create an empty manifest for a session.
    pub fn new(salt_hash: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            tool_version: TOOL_VERSION.to_string(),
            salt_hash: salt_hash.into(),
            checksums: BTreeMap::new(),
            sizes: BTreeMap::new(),
            redaction_summary: BTreeMap::new(),
            redaction_total: 0,
        }
    }

    /// Set the tool version.
    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    /// Copy the counts of a redaction report.
    pub fn with_report(mut self, report: &RedactionReport) -> Self {
        self.redaction_summary = report.summary().clone();
        self.redaction_total = report.total();
        self
    }

    /// Record an entry's checksum and size.
    pub fn add_entry(&mut self, name: impl Into<String>, data: &[u8]) {
        let name = name.into();
        self.checksums.insert(name.clone(), compute_checksum(data));
        self.sizes.insert(name, data.len() as u64);
    }

    /// Checksum recorded for an entry.
    pub fn checksum(&self, name: &str) -> Option<&str> {
        self.checksums.get(name).map(String::as_str)
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.checksums.contains_key(name)
    }

    /// Entry names in archive order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.checksums.keys().map(String::as_str)
    }

    /// Total size of all entries in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.sizes.values().sum()
    }

    /// Number of entries (not including the manifest).
    pub fn entry_count(&self) -> usize {
        self.checksums.len()
    }

    /// Check the format version and structure.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.format_version.as_str()) {
            return Err(BundleError::UnsupportedVersion {
                version: self.format_version.clone(),
                supported: SUPPORTED_VERSIONS.join(", "),
            });
        }

        if !is_sha256_hex(&self.salt_hash) {
            return Err(BundleError::CorruptedManifest(
                "salt_hash is not a SHA-256 hex digest".to_string(),
            ));
        }

        for (name, checksum) in &self.checksums {
            normalize_entry_name(name)?;
            if name == MANIFEST_FILE_NAME {
                return Err(BundleError::CorruptedManifest(
                    "manifest lists itself".to_string(),
                ));
            }
            if !is_sha256_hex(checksum) {
                return Err(BundleError::CorruptedManifest(format!(
                    "entry '{}' has an invalid checksum",
                    name
                )));
            }
            if !self.sizes.contains_key(name) {
                return Err(BundleError::CorruptedManifest(format!(
                    "entry '{}' has no size",
                    name
                )));
            }
        }

        if self.sizes.len() != self.checksums.len() {
            return Err(BundleError::CorruptedManifest(
                "sizes and checksums list different entries".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BundleError::CorruptedManifest(e.to_string()))
    }
}

/// Hex SHA-256 of `data`.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt_hash() -> String {
        compute_checksum(b"salt")
    }

    #[test]
    fn test_manifest_new() {
        let m = BundleManifest::new(salt_hash());
        assert_eq!(m.format_version, FORMAT_VERSION);
        assert_eq!(m.tool_version, TOOL_VERSION);
        assert_eq!(m.entry_count(), 0);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_add_entry() {
        let mut m = BundleManifest::new(salt_hash());
        m.add_entry("output.txt", b"hello");
        m.add_entry("command.json", b"{}");

        assert_eq!(m.entry_count(), 2);
        assert_eq!(m.total_bytes(), 7);
        assert_eq!(m.checksum("output.txt"), Some(compute_checksum(b"hello").as_str()));
        assert!(m.has_entry("command.json"));
        assert_eq!(m.entries().collect::<Vec<_>>(), ["command.json", "output.txt"]);
    }

    #[test]
    fn test_known_checksum() {
        assert_eq!(
            compute_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_report_counts_copied() {
        let mut report = RedactionReport::new();
        report.add("AWS_KEY");
        report.add("AWS_KEY");
        report.add("EMAIL");

        let m = BundleManifest::new(salt_hash()).with_report(&report);
        assert_eq!(m.redaction_total, 3);
        assert_eq!(m.redaction_summary.get("AWS_KEY"), Some(&2));
    }

    #[test]
    fn test_validate_unsupported_version() {
        let mut m = BundleManifest::new(salt_hash());
        m.format_version = "9.9".to_string();
        assert!(matches!(
            m.validate(),
            Err(BundleError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_validate_bad_checksum() {
        let mut m = BundleManifest::new(salt_hash());
        m.add_entry("output.txt", b"x");
        m.checksums
            .insert("output.txt".to_string(), "abc123".to_string());
        assert!(matches!(
            m.validate(),
            Err(BundleError::CorruptedManifest(_))
        ));
    }

    #[test]
    fn test_validate_bad_salt_hash() {
        let m = BundleManifest::new("not-a-hash");
        assert!(matches!(
            m.validate(),
            Err(BundleError::CorruptedManifest(_))
        ));
    }

    #[test]
    fn test_validate_traversal_name() {
        let mut m = BundleManifest::new(salt_hash());
        m.add_entry("../escape.txt", b"x");
        assert!(matches!(
            m.validate(),
            Err(BundleError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_validate_missing_size() {
        let mut m = BundleManifest::new(salt_hash());
        m.add_entry("output.txt", b"x");
        m.sizes.clear();
        assert!(matches!(
            m.validate(),
            Err(BundleError::CorruptedManifest(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut m = BundleManifest::new(salt_hash());
        m.add_entry("output.txt", b"hello");
        let parsed = BundleManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_from_json_garbage() {
        assert!(matches!(
            BundleManifest::from_json("{not json"),
            Err(BundleError::CorruptedManifest(_))
        ));
    }
}
