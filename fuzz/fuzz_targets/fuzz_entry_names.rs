//! Fuzz target for archive entry name normalization.
//!
//! Any accepted name must be relative, free of `..` and `\`, and stable
//! under a second normalization.

#![no_main]

use bugsafe_bundle::normalize_entry_name;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(name) = normalize_entry_name(raw) {
        assert!(!name.is_empty());
        assert!(!name.starts_with('/'));
        assert!(!name.contains('\\'));
        assert!(name.split('/').all(|seg| seg != ".." && seg != "." && !seg.is_empty()));
        assert_eq!(normalize_entry_name(&name).ok().as_deref(), Some(name.as_str()));
    }
});
