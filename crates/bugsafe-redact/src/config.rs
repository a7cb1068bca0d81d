//! Resolved redaction settings consumed by the registry.

use crate::pattern::{PatternSpec, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default per-evaluation deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Settings that decide which patterns run and how long each may take.
///
/// Built once per session (see `bugsafe-config` for the layered builder)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Patterns below this priority are not registered.
    pub min_priority: u8,

    /// Categories to skip entirely.
    pub disabled_categories: BTreeSet<String>,

    /// Pattern names to skip.
    pub disabled_patterns: BTreeSet<String>,

    pub redact_emails: bool,
    pub redact_ips: bool,
    pub redact_uuids: bool,

    /// User-supplied patterns, validated at registry build.
    pub custom_patterns: Vec<PatternSpec>,

    /// Deadline for one pattern on one span; 0 disables the guard.
    pub timeout_ms: u64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_priority: Priority::OPTIONAL,
            disabled_categories: BTreeSet::new(),
            disabled_patterns: BTreeSet::new(),
            redact_emails: true,
            redact_ips: true,
            redact_uuids: false,
            custom_patterns: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PatternConfig {
    /// Set the minimum priority.
    pub fn with_min_priority(mut self, min_priority: u8) -> Self {
        self.min_priority = min_priority;
        self
    }

    /// Disable a category.
    pub fn with_disabled_category(mut self, category: impl Into<String>) -> Self {
        self.disabled_categories.insert(category.into());
        self
    }

    /// Disable a pattern by name.
    pub fn with_disabled_pattern(mut self, name: impl Into<String>) -> Self {
        self.disabled_patterns.insert(name.into());
        self
    }

    /// Add a custom pattern.
    pub fn with_custom_pattern(mut self, spec: PatternSpec) -> Self {
        self.custom_patterns.push(spec);
        self
    }

    /// Set the evaluation deadline.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Toggle email redaction.
    pub fn with_emails(mut self, enabled: bool) -> Self {
        self.redact_emails = enabled;
        self
    }

    /// Toggle IP address redaction.
    pub fn with_ips(mut self, enabled: bool) -> Self {
        self.redact_ips = enabled;
        self
    }

    /// Toggle UUID redaction.
    pub fn with_uuids(mut self, enabled: bool) -> Self {
        self.redact_uuids = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PatternConfig::default();
        assert_eq!(config.min_priority, 60);
        assert!(config.redact_emails);
        assert!(config.redact_ips);
        assert!(!config.redact_uuids);
        assert_eq!(config.timeout_ms, 100);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: PatternConfig = serde_json::from_str(r#"{"redact_uuids": true}"#).unwrap();
        assert!(config.redact_uuids);
        assert!(config.redact_emails);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
