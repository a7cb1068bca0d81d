//! Archive entry name validation.
//!
//! Every name in an archive goes through [`normalize_entry_name`] before any
//! entry is read, so a hostile name is rejected up front rather than at
//! extraction time.

use crate::{BundleError, Result};

// Names are decoded until stable; anything still changing after this many
// rounds is rejected.
const MAX_DECODE_ROUNDS: usize = 8;

/// Normalize and validate an archive entry name.
///
/// Folds `\` to `/`, strips percent-encoding repeatedly and drops `.` and empty
/// segments. Absolute, drive-prefixed, empty, NUL-containing and `..` names are
/// rejected with [`BundleError::PathTraversal`].
pub fn normalize_entry_name(raw: &str) -> Result<String> {
    let reject = || BundleError::PathTraversal {
        entry: raw.to_string(),
    };

    let mut name = raw.replace('\\', "/");
    let mut stable = false;
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = urlencoding::decode(&name)
            .map_err(|_| reject())?
            .replace('\\', "/");
        if decoded == name {
            stable = true;
            break;
        }
        name = decoded;
    }
    if !stable {
        return Err(reject());
    }

    if name.is_empty() || name.contains('\0') || name.starts_with('/') {
        return Err(reject());
    }

    let mut parts = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(reject()),
            p => parts.push(p),
        }
    }
    if parts.first().map_or(true, |first| has_drive_prefix(first)) {
        return Err(reject());
    }
    Ok(parts.join("/"))
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(name: &str) -> bool {
        matches!(
            normalize_entry_name(name),
            Err(BundleError::PathTraversal { .. })
        )
    }

    #[test]
    fn test_plain_names_pass() {
        assert_eq!(normalize_entry_name("output.txt").unwrap(), "output.txt");
        assert_eq!(
            normalize_entry_name("attachments/app.log").unwrap(),
            "attachments/app.log"
        );
        assert_eq!(
            normalize_entry_name("attachments/./x.txt").unwrap(),
            "attachments/x.txt"
        );
    }

    #[test]
    fn test_backslashes_folded() {
        assert_eq!(
            normalize_entry_name(r"attachments\app.log").unwrap(),
            "attachments/app.log"
        );
        assert!(rejected(r"..\..\evil.txt"));
    }

    #[test]
    fn test_parent_segments_rejected() {
        assert!(rejected("../../etc/passwd"));
        assert!(rejected("attachments/../../x"));
        assert!(rejected(".."));
    }

    #[test]
    fn test_absolute_and_drive_rejected() {
        assert!(rejected("/etc/passwd"));
        assert!(rejected(r"\windows\system32"));
        assert!(rejected("C:/Windows/win.ini"));
        assert!(rejected("./C:evil.txt"));
        assert!(rejected("c:evil"));
    }

    #[test]
    fn test_empty_and_nul_rejected() {
        assert!(rejected(""));
        assert!(rejected("/"));
        assert!(rejected("./"));
        assert!(rejected("a\0b"));
    }

    #[test]
    fn test_percent_encoded_rejected() {
        assert!(rejected("%2e%2e%2fetc/passwd"));
        assert!(rejected("%2E%2E/%2E%2E/etc/passwd"));
        assert!(rejected("..%5c..%5cevil"));
        assert!(rejected("%2fetc%2fpasswd"));
        // Double-encoded.
        assert!(rejected("%252e%252e%252fetc"));
        assert!(rejected("a%00b"));
    }

    #[test]
    fn test_invalid_utf8_escape_rejected() {
        assert!(rejected("%ff%fe.txt"));
    }
}
