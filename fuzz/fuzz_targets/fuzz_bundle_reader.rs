//! Fuzz target for .bugbundle reading.
//!
//! Bundles come from untrusted sources: opening, verifying and parsing must
//! return errors, never panic or allocate past the read limits.

#![no_main]

use bugsafe_bundle::BundleReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = BundleReader::from_bytes(data.to_vec()) {
        let _ = reader.check_all();
        let _ = reader.read_bundle();
    }
});
