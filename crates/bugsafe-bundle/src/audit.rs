//! Audit of a written bundle for residual secrets.

use crate::reader::{BundleReader, ReadLimits};
use crate::Result;
use bugsafe_redact::{audit, AuditResult, Registry, TimeoutGuard};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, info};

/// Verify the bundle's integrity, then scan every UTF-8 entry.
///
/// Integrity failures are errors; residual secrets are reported in the
/// returned [`AuditResult`], tagged with the entry they were found in. The
/// manifest is not scanned.
pub fn audit_bundle<R: Read + Seek>(
    reader: &mut BundleReader<R>,
    registry: &Registry,
    guard: &mut TimeoutGuard,
) -> Result<AuditResult> {
    reader.verify_all()?;

    let mut result = AuditResult::clean();
    let names: Vec<String> = reader.manifest().entries().map(String::from).collect();
    for name in &names {
        let data = reader.read_verified(name)?;
        match std::str::from_utf8(&data) {
            Ok(text) => result.merge(audit(text, registry, guard).for_entry(name)),
            Err(_) => debug!(entry = %name, "Skipping non-UTF-8 entry"),
        }
    }

    info!(
        entries = names.len(),
        clean = result.clean,
        findings = result.residual_findings.len(),
        "Bundle audited"
    );
    Ok(result)
}

/// Open the bundle at `path` and audit it.
pub fn audit_path(
    path: &Path,
    registry: &Registry,
    guard: &mut TimeoutGuard,
    limits: ReadLimits,
) -> Result<AuditResult> {
    let mut reader = BundleReader::open_with_limits(path, limits)?;
    audit_bundle(&mut reader, registry, guard)
}
