//! Bundle writer for creating .bugbundle files.
//!
//! Creates ZIP archives with a manifest listing a checksum for every entry.
//! Writes to disk are atomic: the archive is built in a temp file next to the
//! destination and renamed into place only once complete.

use crate::manifest::{BundleManifest, MANIFEST_FILE_NAME, TOOL_VERSION};
use crate::schema::{
    CommandRecord, Environment, Traceback, ATTACHMENTS_DIR, COMMAND_FILE_NAME,
    ENVIRONMENT_FILE_NAME, OUTPUT_FILE_NAME, STDERR_FILE_NAME, TRACEBACK_FILE_NAME,
};
use crate::{BundleError, Result};
use bugsafe_redact::{audit, AuditResult, RedactionReport, Registry, Salt, TimeoutGuard};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Largest bundle accepted, summed over uncompressed entries.
pub const MAX_BUNDLE_SIZE: u64 = 50 * 1024 * 1024;

/// Largest single attachment.
pub const MAX_ATTACHMENT_SIZE: u64 = 10 * 1024 * 1024;

pub const MAX_ATTACHMENTS: usize = 20;

/// Attachment extensions accepted (lowercase, with dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".txt", ".log", ".yaml", ".yml", ".json", ".toml", ".ini", ".cfg", ".md", ".rst",
];

/// Size limits applied while building a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLimits {
    pub max_total_bytes: u64,
    pub max_attachment_bytes: u64,
    pub max_attachments: usize,
}

impl Default for WriteLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: MAX_BUNDLE_SIZE,
            max_attachment_bytes: MAX_ATTACHMENT_SIZE,
            max_attachments: MAX_ATTACHMENTS,
        }
    }
}

struct SelfCheck {
    registry: Registry,
    timeout_ms: u64,
}

/// Builder for .bugbundle archives.
///
/// Content handed to the writer must already be redacted; the writer only
/// records checksums and, when a self-check is configured, re-audits every
/// text entry before anything touches disk.
pub struct BundleWriter {
    entries: BTreeMap<String, Vec<u8>>,
    attachments: usize,
    limits: WriteLimits,
    tool_version: String,
    self_check: Option<SelfCheck>,
}

impl Default for BundleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleWriter {
    /// Create an empty writer with default limits.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            attachments: 0,
            limits: WriteLimits::default(),
            tool_version: TOOL_VERSION.to_string(),
            self_check: None,
        }
    }

    pub fn with_limits(mut self, limits: WriteLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the tool version recorded in the manifest.
    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    /// Audit every text entry with `registry` before writing; any residual
    /// finding fails the write with [`BundleError::SelfCheckFailed`].
    pub fn with_self_check(mut self, registry: Registry, timeout_ms: u64) -> Self {
        self.self_check = Some(SelfCheck {
            registry,
            timeout_ms,
        });
        self
    }

    fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        debug!(entry = %name, bytes = data.len(), "Added entry to bundle");
        self.entries.insert(name, data);
    }

    fn insert_json<T: serde::Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.insert(name, json.into_bytes());
        Ok(())
    }

    /// Add captured stdout as `output.txt` and, when not empty, stderr as
    /// `stderr.txt`. Both are stored byte for byte.
    pub fn add_output(&mut self, stdout: &str, stderr: &str) {
        self.insert(OUTPUT_FILE_NAME, stdout.as_bytes().to_vec());
        if !stderr.is_empty() {
            self.insert(STDERR_FILE_NAME, stderr.as_bytes().to_vec());
        }
    }

    pub fn add_traceback(&mut self, traceback: &Traceback) -> Result<()> {
        self.insert_json(TRACEBACK_FILE_NAME, traceback)
    }

    pub fn add_environment(&mut self, environment: &Environment) -> Result<()> {
        self.insert_json(ENVIRONMENT_FILE_NAME, environment)
    }

    pub fn add_command(&mut self, command: &CommandRecord) -> Result<()> {
        self.insert_json(COMMAND_FILE_NAME, command)
    }

    /// Add a text attachment under `attachments/`.
    ///
    /// The name is sanitised and made unique; the stored name is returned.
    pub fn add_attachment(&mut self, name: &str, content: &str) -> Result<String> {
        if self.attachments >= self.limits.max_attachments {
            return Err(BundleError::Attachment(format!(
                "too many attachments (limit {})",
                self.limits.max_attachments
            )));
        }

        let size = content.len() as u64;
        if size > self.limits.max_attachment_bytes {
            return Err(BundleError::Attachment(format!(
                "'{}' is {} bytes (limit {})",
                name, size, self.limits.max_attachment_bytes
            )));
        }

        let safe = sanitize_filename(name);
        let ext = extension(&safe);
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(BundleError::Attachment(format!(
                "extension '{}' not allowed for '{}'",
                ext, name
            )));
        }

        let existing: BTreeSet<&str> = self
            .entries
            .keys()
            .filter_map(|k| k.strip_prefix(ATTACHMENTS_DIR))
            .collect();
        let unique = unique_name(&safe, &existing);

        self.insert(
            format!("{}{}", ATTACHMENTS_DIR, unique),
            content.as_bytes().to_vec(),
        );
        self.attachments += 1;
        Ok(unique)
    }

    /// Total size of all entries in bytes, before compression.
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|d| d.len() as u64).sum()
    }

    /// Number of entries (not including the manifest).
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Write the bundle to `path` atomically.
    ///
    /// On any failure the destination is left untouched and the temp file is
    /// removed.
    pub fn write(self, path: &Path, report: &RedactionReport, salt: &Salt) -> Result<BundleManifest> {
        let manifest = self.prepare(report, salt)?;
        let manifest_json = manifest.to_json()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        self.write_archive(tmp.as_file_mut(), manifest_json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| BundleError::Io(e.error))?;

        info!(
            path = %path.display(),
            entries = self.entries.len(),
            bytes = self.total_bytes(),
            redactions = manifest.redaction_total,
            "Bundle written"
        );

        Ok(manifest)
    }

    /// Write the bundle to a byte vector (for in-memory use).
    pub fn write_to_vec(
        self,
        report: &RedactionReport,
        salt: &Salt,
    ) -> Result<(Vec<u8>, BundleManifest)> {
        let manifest = self.prepare(report, salt)?;
        let manifest_json = manifest.to_json()?;

        let buffer = self.write_archive(Cursor::new(Vec::new()), manifest_json.as_bytes())?;
        let bytes = buffer.into_inner();

        info!(
            entries = self.entries.len(),
            compressed_bytes = bytes.len(),
            uncompressed_bytes = self.total_bytes(),
            "Bundle written to memory"
        );

        Ok((bytes, manifest))
    }

    fn prepare(&self, report: &RedactionReport, salt: &Salt) -> Result<BundleManifest> {
        if self.entries.is_empty() {
            return Err(BundleError::EmptyBundle);
        }

        let total = self.total_bytes();
        if total > self.limits.max_total_bytes {
            return Err(BundleError::BundleTooLarge {
                size: total,
                limit: self.limits.max_total_bytes,
            });
        }

        if let Some(check) = &self.self_check {
            self.run_self_check(check)?;
        }

        let mut manifest = BundleManifest::new(salt.hash_hex())
            .with_tool_version(self.tool_version.clone())
            .with_report(report);
        for (name, data) in &self.entries {
            manifest.add_entry(name.clone(), data);
        }
        Ok(manifest)
    }

    fn run_self_check(&self, check: &SelfCheck) -> Result<()> {
        let mut guard = TimeoutGuard::new(check.timeout_ms);
        let mut result = AuditResult::clean();
        for (name, data) in &self.entries {
            if let Ok(text) = std::str::from_utf8(data) {
                result.merge(audit(text, &check.registry, &mut guard).for_entry(name));
            }
        }

        if result.clean {
            debug!(entries = self.entries.len(), "Self-check passed");
            return Ok(());
        }

        warn!(
            findings = result.residual_findings.len(),
            categories = ?result.categories(),
            "Self-check found unredacted values"
        );
        Err(BundleError::SelfCheckFailed {
            findings: result.residual_findings,
        })
    }

    /// Manifest first, then entries in name order.
    fn write_archive<W: Write + Seek>(&self, writer: W, manifest_json: &[u8]) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(manifest_json)?;

        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }
}

/// Reduce an attachment name to a safe base name.
///
/// Directory parts are dropped, `..` is neutralised and anything outside
/// letters, digits, `.`, `_` and `-` becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .replace("..", "_")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Lowercase extension including the dot, or empty.
fn extension(name: &str) -> String {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos..].to_lowercase(),
        _ => String::new(),
    }
}

/// `name`, or `stem_N.ext` for the first free `N` starting at 1.
fn unique_name(name: &str, existing: &BTreeSet<&str>) -> String {
    if !existing.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    };
    (1..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .unwrap_or_else(|| name.to_string())
}
