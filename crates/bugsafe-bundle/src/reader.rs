//! Bundle reader for opening and verifying .bugbundle files.
//!
//! Opening a bundle validates every entry name and cross-checks the archive
//! against the manifest before any entry content is read. Every read is
//! bounded and checksum-verified.

use crate::manifest::{compute_checksum, BundleManifest, MANIFEST_FILE_NAME};
use crate::paths::normalize_entry_name;
use crate::schema::{
    CommandRecord, Environment, Traceback, ATTACHMENTS_DIR, COMMAND_FILE_NAME,
    ENVIRONMENT_FILE_NAME, OUTPUT_FILE_NAME, STDERR_FILE_NAME, TRACEBACK_FILE_NAME,
};
use crate::writer::MAX_BUNDLE_SIZE;
use crate::{BundleError, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Most entries an archive may hold, manifest included.
pub const MAX_ENTRIES: usize = 64;

/// Bounds applied while reading an untrusted archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Largest single entry, uncompressed.
    pub max_entry_bytes: u64,
    /// Largest sum of declared entry sizes.
    pub max_total_bytes: u64,
    pub max_entries: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_entry_bytes: MAX_BUNDLE_SIZE,
            max_total_bytes: MAX_BUNDLE_SIZE,
            max_entries: MAX_ENTRIES,
        }
    }
}

/// Fully verified bundle contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub manifest: BundleManifest,
    pub stdout: String,
    pub stderr: String,
    pub traceback: Option<Traceback>,
    pub environment: Option<Environment>,
    pub command: Option<CommandRecord>,
    /// Attachment name (without `attachments/`) to content.
    pub attachments: BTreeMap<String, String>,
}

/// Reader for .bugbundle archives with verification.
pub struct BundleReader<R: Read + Seek> {
    manifest: BundleManifest,
    archive: ZipArchive<R>,
    limits: ReadLimits,
    verified: HashSet<String>,
}

impl BundleReader<File> {
    /// Open a bundle from a file path with default limits.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_limits(path, ReadLimits::default())
    }

    pub fn open_with_limits(path: &Path, limits: ReadLimits) -> Result<Self> {
        let file = File::open(path)?;
        let reader = Self::from_reader(file, limits)?;
        info!(
            path = %path.display(),
            entries = reader.manifest.entry_count(),
            version = %reader.manifest.format_version,
            "Bundle opened"
        );
        Ok(reader)
    }
}

impl BundleReader<Cursor<Vec<u8>>> {
    /// Open a bundle from bytes with default limits.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes), ReadLimits::default())
    }
}

impl<R: Read + Seek> BundleReader<R> {
    /// Create a reader from any Read + Seek source.
    pub fn from_reader(reader: R, limits: ReadLimits) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        if archive.len() > limits.max_entries {
            return Err(BundleError::TooManyEntries {
                count: archive.len(),
                limit: limits.max_entries,
            });
        }

        let names = Self::validate_names(&mut archive, &limits)?;

        let manifest = Self::read_manifest(&mut archive, &limits)?;
        manifest.validate()?;

        for name in &names {
            if !manifest.has_entry(name) {
                warn!(entry = %name, "Entry not listed in manifest");
                return Err(BundleError::Integrity {
                    entry: name.clone(),
                    expected: "entry listed in manifest".to_string(),
                    actual: "unlisted entry".to_string(),
                });
            }
        }
        let present: HashSet<&str> = names.iter().map(String::as_str).collect();
        for (name, checksum) in &manifest.checksums {
            if !present.contains(name.as_str()) {
                warn!(entry = %name, "Manifest entry missing from archive");
                return Err(BundleError::Integrity {
                    entry: name.clone(),
                    expected: checksum.clone(),
                    actual: "missing".to_string(),
                });
            }
        }

        debug!(entries = names.len(), "Bundle structure verified");

        Ok(Self {
            manifest,
            archive,
            limits,
            verified: HashSet::new(),
        })
    }

    /// Validate every entry name and the declared sizes, returning the
    /// non-manifest names.
    fn validate_names(archive: &mut ZipArchive<R>, limits: &ReadLimits) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(archive.len());
        let mut normalized_seen = HashSet::new();
        let mut declared_total: u64 = 0;

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let name = file.name().to_string();

            let normalized = normalize_entry_name(&name)?;
            if file.enclosed_name().is_none() || !normalized_seen.insert(normalized.clone()) {
                return Err(BundleError::PathTraversal { entry: name });
            }

            declared_total = declared_total.saturating_add(file.size());
            if declared_total > limits.max_total_bytes {
                return Err(BundleError::BundleTooLarge {
                    size: declared_total,
                    limit: limits.max_total_bytes,
                });
            }

            if normalized != MANIFEST_FILE_NAME {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn read_manifest(archive: &mut ZipArchive<R>, limits: &ReadLimits) -> Result<BundleManifest> {
        let data = read_bounded(archive, MANIFEST_FILE_NAME, limits.max_entry_bytes)?;
        let json = std::str::from_utf8(&data)
            .map_err(|_| BundleError::CorruptedManifest("manifest is not UTF-8".to_string()))?;
        BundleManifest::from_json(json)
    }

    /// Get the manifest.
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn limits(&self) -> ReadLimits {
        self.limits
    }

    /// Check if an entry exists in the bundle.
    pub fn has_entry(&self, name: &str) -> bool {
        self.manifest.has_entry(name)
    }

    /// Attachment entry names, with the `attachments/` prefix.
    pub fn attachments(&self) -> Vec<&str> {
        self.manifest
            .entries()
            .filter(|n| n.starts_with(ATTACHMENTS_DIR))
            .collect()
    }

    /// Raw manifest bytes as stored in the archive.
    pub fn read_manifest_raw(&mut self) -> Result<Vec<u8>> {
        read_bounded(
            &mut self.archive,
            MANIFEST_FILE_NAME,
            self.limits.max_entry_bytes,
        )
    }

    /// Read an entry with checksum verification.
    pub fn read_verified(&mut self, name: &str) -> Result<Vec<u8>> {
        let expected = self
            .manifest
            .checksum(name)
            .ok_or_else(|| BundleError::MissingEntry(name.to_string()))?
            .to_string();

        let data = read_bounded(&mut self.archive, name, self.limits.max_entry_bytes)?;

        let actual = compute_checksum(&data);
        if actual != expected {
            warn!(entry = name, "Checksum mismatch");
            return Err(BundleError::Integrity {
                entry: name.to_string(),
                expected,
                actual,
            });
        }

        self.verified.insert(name.to_string());
        debug!(entry = name, bytes = data.len(), "Entry verified");

        Ok(data)
    }

    /// Check if an entry has been verified.
    pub fn is_verified(&self, name: &str) -> bool {
        self.verified.contains(name)
    }

    /// Verify every entry, stopping at the first failure.
    pub fn verify_all(&mut self) -> Result<()> {
        let names: Vec<String> = self.manifest.entries().map(String::from).collect();
        for name in names {
            self.read_verified(&name)?;
        }
        info!(entries = self.manifest.entry_count(), "All entries verified");
        Ok(())
    }

    /// Verify every entry, collecting failures instead of stopping.
    ///
    /// Returns `(entry, error)` for each entry that failed.
    pub fn check_all(&mut self) -> Vec<(String, BundleError)> {
        let names: Vec<String> = self.manifest.entries().map(String::from).collect();
        let mut failures = Vec::new();
        for name in names {
            if let Err(e) = self.read_verified(&name) {
                warn!(entry = %name, error = %e, "Verification failed");
                failures.push((name, e));
            }
        }
        failures
    }

    /// Read a verified entry as UTF-8 text.
    pub fn read_text(&mut self, name: &str) -> Result<String> {
        let data = self.read_verified(name)?;
        String::from_utf8(data).map_err(|_| BundleError::NotText {
            entry: name.to_string(),
        })
    }

    /// Read and parse a verified JSON entry.
    pub fn read_json<T: serde::de::DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let data = self.read_verified(name)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn read_text_opt(&mut self, name: &str) -> Result<String> {
        if self.has_entry(name) {
            self.read_text(name)
        } else {
            Ok(String::new())
        }
    }

    fn read_json_opt<T: serde::de::DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>> {
        if self.has_entry(name) {
            Ok(Some(self.read_json(name)?))
        } else {
            Ok(None)
        }
    }

    /// Verify the whole archive, then parse every known entry.
    pub fn read_bundle(&mut self) -> Result<Bundle> {
        self.verify_all()?;

        let stdout = self.read_text_opt(OUTPUT_FILE_NAME)?;
        let stderr = self.read_text_opt(STDERR_FILE_NAME)?;

        let traceback = self.read_json_opt(TRACEBACK_FILE_NAME)?;
        let environment = self.read_json_opt(ENVIRONMENT_FILE_NAME)?;
        let command = self.read_json_opt(COMMAND_FILE_NAME)?;

        let mut attachments = BTreeMap::new();
        let names: Vec<String> = self.attachments().into_iter().map(String::from).collect();
        for name in names {
            let content = self.read_text(&name)?;
            let short = name.trim_start_matches(ATTACHMENTS_DIR).to_string();
            attachments.insert(short, content);
        }

        Ok(Bundle {
            manifest: self.manifest.clone(),
            stdout,
            stderr,
            traceback,
            environment,
            command,
            attachments,
        })
    }
}

/// Open, verify and parse the bundle at `path`.
pub fn read_bundle(path: &Path) -> Result<Bundle> {
    BundleReader::open(path)?.read_bundle()
}

/// Read one entry, never buffering more than `limit` bytes.
///
/// The declared size is checked first; the read itself is capped too, since
/// the declared size comes from the archive and may lie.
fn read_bounded<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    limit: u64,
) -> Result<Vec<u8>> {
    let file = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => BundleError::MissingEntry(name.to_string()),
        other => BundleError::Zip(other),
    })?;

    let declared = file.size();
    if declared > limit {
        return Err(BundleError::OversizedEntry {
            entry: name.to_string(),
            size: declared,
            limit,
        });
    }

    let mut data = Vec::with_capacity(declared as usize);
    file.take(limit + 1)
        .read_to_end(&mut data)
        .map_err(|e| read_error(name, e))?;

    if data.len() as u64 > limit {
        return Err(BundleError::OversizedEntry {
            entry: name.to_string(),
            size: data.len() as u64,
            limit,
        });
    }
    Ok(data)
}

// Corrupted compressed data or a CRC mismatch surfaces as InvalidData.
fn read_error(name: &str, err: io::Error) -> BundleError {
    if err.kind() == io::ErrorKind::InvalidData {
        BundleError::Integrity {
            entry: name.to_string(),
            expected: "intact compressed data".to_string(),
            actual: err.to_string(),
        }
    } else {
        BundleError::Io(err)
    }
}
