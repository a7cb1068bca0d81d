//! Secret redaction for bugsafe bundles.
//!
//! This crate turns raw debugging text into shareable text: known secret
//! shapes are replaced by stable `<CATEGORY_N>` tokens and machine-specific
//! paths by fixed placeholders.
//!
//! # Key Features
//!
//! - **Uniform patterns**: built-in and custom rules are the same data record,
//!   filtered and ordered by a per-session [`Registry`].
//! - **Bounded evaluation**: each pattern runs under a deadline on a worker
//!   thread; a slow pattern is skipped with a warning, never fatal.
//! - **Salted tokens**: HMAC-SHA256 keyed by a random per-session salt, so the
//!   same value always maps to the same token within a session and to
//!   unrelated tokens across sessions. Only `sha256(salt)` is ever exported.
//! - **Idempotent**: existing tokens and path placeholders are never re-matched.
//!
//! # Example
//!
//! ```no_run
//! use bugsafe_redact::{PatternConfig, RedactionSession};
//!
//! let mut session = RedactionSession::new(&PatternConfig::default()).unwrap();
//! let out = session.redact("API_KEY=sk-abc123xyz");
//! assert_eq!(out, "API_KEY=<API_KEY_1>");
//! assert_eq!(session.report().total(), 1);
//! ```

pub mod anonymize;
pub mod audit;
pub mod builtin;
pub mod config;
pub mod error;
pub mod finding;
pub mod guard;
pub mod matcher;
pub mod pattern;
pub mod registry;
pub mod report;
pub mod session;
pub mod tokenizer;

pub use anonymize::{AnonymizerOptions, Identity, PathAnonymizer};
pub use audit::{audit, AuditResult};
pub use config::{PatternConfig, DEFAULT_TIMEOUT_MS};
pub use error::{RedactionError, Result};
pub use finding::Finding;
pub use guard::{Evaluation, TimeoutGuard};
pub use matcher::{detect, redact, Detection, MIN_SECRET_LENGTH};
pub use pattern::{Pattern, PatternSpec, Priority};
pub use registry::Registry;
pub use report::{RedactionReport, ReportWarning};
pub use session::RedactionSession;
pub use tokenizer::{is_token, Salt, Tokenizer};
