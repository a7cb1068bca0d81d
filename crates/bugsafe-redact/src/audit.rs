//! Read-only verification of redacted text.

use crate::finding::Finding;
use crate::guard::TimeoutGuard;
use crate::matcher::detect;
use crate::registry::Registry;
use crate::report::ReportWarning;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of re-scanning text that should already be redacted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditResult {
    pub clean: bool,
    pub residual_findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReportWarning>,
}

impl AuditResult {
    /// A clean result with no findings.
    pub fn clean() -> Self {
        Self {
            clean: true,
            ..Default::default()
        }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: AuditResult) {
        self.clean &= other.clean;
        self.residual_findings.extend(other.residual_findings);
        self.warnings.extend(other.warnings);
    }

    /// Tag every finding with a bundle entry name.
    pub fn for_entry(mut self, entry: &str) -> Self {
        for finding in &mut self.residual_findings {
            finding.entry = Some(entry.to_string());
        }
        self
    }

    /// Residual findings per category.
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.residual_findings {
            *counts.entry(finding.category.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Scan `text` for anything the registry would still redact.
///
/// No tokenizer or report is touched; a result that is not clean is a value,
/// not an error.
pub fn audit(text: &str, registry: &Registry, guard: &mut TimeoutGuard) -> AuditResult {
    let detection = detect(text, registry, guard);
    AuditResult {
        clean: detection.findings.is_empty(),
        residual_findings: detection.findings,
        warnings: detection.warnings,
    }
}
