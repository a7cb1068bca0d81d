//! One redaction session: a registry, a guard, a tokenizer and a report.
//!
//! Every span that ends up in the same bundle goes through the same session,
//! so a value seen in stdout and again in an environment variable gets the
//! same token.

use crate::anonymize::{AnonymizerOptions, PathAnonymizer};
use crate::audit::{audit, AuditResult};
use crate::config::PatternConfig;
use crate::error::Result;
use crate::guard::TimeoutGuard;
use crate::matcher;
use crate::registry::Registry;
use crate::report::RedactionReport;
use crate::tokenizer::{Salt, Tokenizer};
use std::collections::BTreeMap;
use tracing::debug;

/// Single-writer redaction pipeline: match, tokenize, anonymize.
#[derive(Debug)]
pub struct RedactionSession {
    registry: Registry,
    guard: TimeoutGuard,
    tokenizer: Tokenizer,
    report: RedactionReport,
    anonymizer: PathAnonymizer,
}

impl RedactionSession {
    /// Start a session with a fresh random salt and default path rules.
    pub fn new(config: &PatternConfig) -> Result<Self> {
        Self::with_parts(
            config,
            Salt::generate()?,
            PathAnonymizer::new(AnonymizerOptions::default()),
        )
    }

    /// Start a session from explicit parts.
    pub fn with_parts(
        config: &PatternConfig,
        salt: Salt,
        anonymizer: PathAnonymizer,
    ) -> Result<Self> {
        let registry = Registry::build(config)?;
        debug!(
            patterns = registry.active_count(),
            timeout_ms = config.timeout_ms,
            "redaction session started"
        );
        Ok(Self {
            registry,
            guard: TimeoutGuard::new(config.timeout_ms),
            tokenizer: Tokenizer::new(salt),
            report: RedactionReport::new(),
            anonymizer,
        })
    }

    /// Redact one span of text.
    pub fn redact(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let tokenized = matcher::redact(
            text,
            &self.registry,
            &mut self.guard,
            &mut self.tokenizer,
            &mut self.report,
        );
        self.anonymizer.anonymize(&tokenized).into_owned()
    }

    /// Redact each item of a list, e.g. command arguments.
    pub fn redact_all<S: AsRef<str>>(&mut self, items: &[S]) -> Vec<String> {
        items.iter().map(|s| self.redact(s.as_ref())).collect()
    }

    /// Redact environment variables as `NAME=value` spans so key-based
    /// patterns see the variable name.
    pub fn redact_env(&mut self, vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        vars.iter()
            .map(|(name, value)| {
                let line = self.redact(&format!("{}={}", name, value));
                match line.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (name.clone(), line),
                }
            })
            .collect()
    }

    /// Scan text with this session's registry without changing any state
    /// other than the guard's worker.
    pub fn audit(&mut self, text: &str) -> AuditResult {
        audit(text, &self.registry, &mut self.guard)
    }

    /// Hex SHA-256 of the session salt.
    pub fn salt_hash(&self) -> String {
        self.tokenizer.salt_hash()
    }

    pub fn salt(&self) -> &Salt {
        self.tokenizer.salt()
    }

    /// Running report for everything redacted so far.
    pub fn report(&self) -> &RedactionReport {
        &self.report
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of distinct tokens issued.
    pub fn unique_tokens(&self) -> usize {
        self.tokenizer.unique_tokens()
    }

    /// End the session, returning its report.
    pub fn finish(self) -> RedactionReport {
        self.report
    }
}
