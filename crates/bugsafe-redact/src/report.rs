//! Per-session redaction counts and warnings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Non-fatal event recorded during redaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// A pattern exceeded its deadline on one span and was skipped there.
    PatternTimeout {
        pattern: String,
        span_len: usize,
        elapsed_ms: u64,
    },
}

impl std::fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWarning::PatternTimeout {
                pattern,
                span_len,
                elapsed_ms,
            } => write!(
                f,
                "pattern '{}' timed out after {}ms on a {}-byte span",
                pattern, elapsed_ms, span_len
            ),
        }
    }
}

/// Category counts for every redacted occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionReport {
    counts: BTreeMap<String, u64>,
    total: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<ReportWarning>,
}

impl RedactionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one redacted occurrence.
    pub fn add(&mut self, category: &str) {
        *self.counts.entry(category.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    /// Record a warning.
    pub fn warn(&mut self, warning: ReportWarning) {
        self.warnings.push(warning);
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: &RedactionReport) {
        for (category, n) in &other.counts {
            *self.counts.entry(category.clone()).or_insert(0) += n;
        }
        self.total += other.total;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Counts per category.
    pub fn summary(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Count for one category.
    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Total redacted occurrences.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn warnings(&self) -> &[ReportWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
