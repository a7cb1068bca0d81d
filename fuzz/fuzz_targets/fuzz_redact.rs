//! Fuzz target for the redaction pipeline.
//!
//! Arbitrary text must redact and re-audit without panicking.

#![no_main]

use bugsafe_redact::{AnonymizerOptions, PathAnonymizer, PatternConfig, RedactionSession, Salt};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut session) = RedactionSession::with_parts(
        &PatternConfig::default().with_timeout_ms(0),
        Salt::from_bytes([7; 32]),
        PathAnonymizer::new(AnonymizerOptions::disabled()),
    ) else {
        return;
    };
    let once = session.redact(text);
    let _ = session.audit(&once);
});
