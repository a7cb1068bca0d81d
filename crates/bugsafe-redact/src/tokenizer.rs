//! Deterministic, session-scoped tokenization.
//!
//! A raw value and its category are hashed with HMAC-SHA256 keyed by a random
//! per-session salt. The first time a hash is seen the category counter is
//! bumped and `<CATEGORY_N>` is allocated; later occurrences reuse the token.
//! The salt never leaves the process, only its SHA-256 digest does.

use crate::error::{RedactionError, Result};
use crate::pattern::normalize_category;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Values are capped at this many characters before hashing.
pub const MAX_VALUE_CHARS: usize = 1024;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<[A-Z][A-Z0-9_]*_[1-9][0-9]*>$").unwrap());

/// Per-session random salt.
///
/// There is no accessor for the raw bytes outside this crate.
#[derive(Clone)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Generate a fresh salt from the OS random source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| RedactionError::Salt(format!("failed to generate random salt: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Use fixed salt bytes. Intended for reproducible tests.
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Hex-encoded SHA-256 of the salt, safe to persist.
    pub fn hash_hex(&self) -> String {
        hex::encode(Sha256::digest(self.0))
    }

    fn keyed(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt(sha256={})", &self.hash_hex()[..12])
    }
}

/// Tokenizer state for one session.
pub struct Tokenizer {
    salt: Salt,
    token_map: HashMap<[u8; 32], String>,
    counters: BTreeMap<String, u64>,
}

impl Tokenizer {
    /// Create a tokenizer with the given salt.
    pub fn new(salt: Salt) -> Self {
        Self {
            salt,
            token_map: HashMap::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Create a tokenizer with a freshly generated salt.
    pub fn generate() -> Result<Self> {
        Ok(Self::new(Salt::generate()?))
    }

    /// Map a raw value to its token, allocating one if unseen.
    pub fn tokenize(&mut self, raw_value: &str, category: &str) -> String {
        let category = normalize_category(category);
        let key = self.hash(normalize_value(raw_value), &category);

        if let Some(token) = self.token_map.get(&key) {
            return token.clone();
        }

        let counter = self.counters.entry(category.clone()).or_insert(0);
        *counter += 1;
        let token = format!("<{}_{}>", category, counter);
        self.token_map.insert(key, token.clone());
        token
    }

    /// Hex SHA-256 of the session salt.
    pub fn salt_hash(&self) -> String {
        self.salt.hash_hex()
    }

    /// The session salt.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Number of distinct tokens allocated so far.
    pub fn unique_tokens(&self) -> usize {
        self.token_map.len()
    }

    /// Highest counter allocated per category.
    pub fn category_counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    fn hash(&self, value: &str, category: &str) -> [u8; 32] {
        let mut mac = self.salt.keyed();
        mac.update(category.as_bytes());
        mac.update(&[0u8]);
        mac.update(value.as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("salt", &self.salt)
            .field("unique_tokens", &self.token_map.len())
            .field("counters", &self.counters)
            .finish()
    }
}

/// Whether `s` is exactly one token in `<CATEGORY_N>` form.
pub fn is_token(s: &str) -> bool {
    RE_TOKEN.is_match(s)
}

fn normalize_value(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(MAX_VALUE_CHARS) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}
