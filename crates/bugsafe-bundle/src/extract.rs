//! Safe extraction of a verified bundle to disk.

use crate::manifest::MANIFEST_FILE_NAME;
use crate::paths::normalize_entry_name;
use crate::reader::{BundleReader, ReadLimits};
use crate::{BundleError, Result};
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract the bundle at `path` into `dir`.
///
/// Returns the written file paths, manifest first.
pub fn extract(path: &Path, dir: &Path, limits: ReadLimits) -> Result<Vec<PathBuf>> {
    let mut reader = BundleReader::open_with_limits(path, limits)?;
    extract_to(&mut reader, dir)
}

/// Extract an open bundle into `dir`.
///
/// Every entry is verified before the first file is written, so a tampered
/// archive leaves nothing behind. Each destination's parent is canonicalized
/// and must stay below the canonical `dir`.
pub fn extract_to<R: Read + Seek>(reader: &mut BundleReader<R>, dir: &Path) -> Result<Vec<PathBuf>> {
    reader.verify_all()?;

    fs::create_dir_all(dir)?;
    let root = dir.canonicalize()?;

    let mut written = Vec::new();

    let manifest = reader.read_manifest_raw()?;
    written.push(write_entry(&root, MANIFEST_FILE_NAME, &manifest)?);

    let names: Vec<String> = reader.manifest().entries().map(String::from).collect();
    for name in names {
        let data = reader.read_verified(&name)?;
        written.push(write_entry(&root, &name, &data)?);
    }

    info!(
        dir = %root.display(),
        files = written.len(),
        "Bundle extracted"
    );
    Ok(written)
}

fn write_entry(root: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    let dest = destination(root, name)?;
    fs::write(&dest, data)?;
    debug!(entry = name, path = %dest.display(), bytes = data.len(), "Extracted entry");
    Ok(dest)
}

/// Resolve `name` below `root`, creating parent directories.
fn destination(root: &Path, name: &str) -> Result<PathBuf> {
    let reject = || BundleError::PathTraversal {
        entry: name.to_string(),
    };

    let relative = normalize_entry_name(name)?;
    let joined = root.join(&relative);
    let file_name = joined.file_name().ok_or_else(reject)?.to_owned();
    let parent = joined.parent().ok_or_else(reject)?;

    fs::create_dir_all(parent)?;
    let parent = parent.canonicalize()?;
    if !parent.starts_with(root) {
        return Err(reject());
    }

    let dest = parent.join(file_name);
    if let Ok(meta) = fs::symlink_metadata(&dest) {
        if meta.file_type().is_symlink() || meta.is_dir() {
            return Err(reject());
        }
    }
    Ok(dest)
}
