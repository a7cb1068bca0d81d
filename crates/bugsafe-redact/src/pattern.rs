//! Detection pattern records.
//!
//! Built-in and user-supplied patterns share one representation: a compiled
//! regex plus metadata. Behaviour never differs by origin, only data does.

use crate::error::{RedactionError, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Longest regex source accepted for a pattern.
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// Compiled program size limit for user-supplied patterns.
const CUSTOM_SIZE_LIMIT: usize = 1 << 20;

/// Default priority for custom patterns that do not set one.
pub const DEFAULT_CUSTOM_PRIORITY: i64 = Priority::MEDIUM as i64;

static RE_CATEGORY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

/// Named priority levels used by the built-in set.
pub struct Priority;

impl Priority {
    pub const CRITICAL: u8 = 100;
    pub const HIGH: u8 = 90;
    pub const MEDIUM: u8 = 80;
    pub const LOW: u8 = 70;
    pub const OPTIONAL: u8 = 60;
    pub const DISABLED: u8 = 0;
}

/// Uncompiled pattern definition, as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Unique pattern identifier.
    pub name: String,

    /// Regular expression source.
    pub regex: String,

    /// Category used for token labels (e.g. `API_KEY`).
    pub category: String,

    /// Evaluation priority, 0–100. Kept wide so out-of-range input is reported
    /// instead of silently truncated.
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// Which capture group holds the secret (0 = whole match).
    #[serde(default)]
    pub capture_group: usize,

    /// Captured values that also match this regex are discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_priority() -> i64 {
    DEFAULT_CUSTOM_PRIORITY
}

impl PatternSpec {
    /// Create a spec with default priority and capture group.
    pub fn new(
        name: impl Into<String>,
        regex: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            category: category.into(),
            priority: DEFAULT_CUSTOM_PRIORITY,
            capture_group: 0,
            exclude: None,
            description: None,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the capture group.
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = group;
        self
    }

    /// Set the exclusion regex.
    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = Some(exclude.into());
        self
    }
}

/// A compiled detection pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub regex: Regex,
    pub category: String,
    pub priority: u8,
    pub capture_group: usize,
    pub enabled: bool,
    pub exclude: Option<Regex>,
    pub description: String,
}

impl Pattern {
    /// Validate and compile a spec.
    ///
    /// Fails if the regex does not compile or is too long, the priority is
    /// outside 0–100, the category is malformed, or the capture group does
    /// not exist in the regex.
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(RedactionError::invalid_pattern(&spec.name, "name is empty"));
        }

        if spec.regex.len() > MAX_PATTERN_LENGTH {
            return Err(RedactionError::invalid_pattern(
                &spec.name,
                format!(
                    "regex too long: {} chars > {} limit",
                    spec.regex.len(),
                    MAX_PATTERN_LENGTH
                ),
            ));
        }

        if !(0..=100).contains(&spec.priority) {
            return Err(RedactionError::invalid_pattern(
                &spec.name,
                format!("priority must be within 0-100, got {}", spec.priority),
            ));
        }

        let category = normalize_category(&spec.category);
        if !RE_CATEGORY.is_match(&category) {
            return Err(RedactionError::invalid_pattern(
                &spec.name,
                format!("category '{}' must match [A-Z][A-Z0-9_]*", spec.category),
            ));
        }

        let regex = compile_regex(&spec.name, &spec.regex)?;
        let groups = regex.captures_len();
        if spec.capture_group >= groups {
            return Err(RedactionError::invalid_pattern(
                &spec.name,
                format!(
                    "capture group {} out of range (regex has {} groups)",
                    spec.capture_group,
                    groups - 1
                ),
            ));
        }

        let exclude = spec
            .exclude
            .as_deref()
            .map(|src| compile_regex(&spec.name, src))
            .transpose()?;

        Ok(Self {
            name: spec.name.clone(),
            regex,
            category,
            priority: spec.priority as u8,
            capture_group: spec.capture_group,
            enabled: true,
            exclude,
            description: spec.description.clone().unwrap_or_default(),
        })
    }

    /// Whether a captured value is rejected by the exclusion regex.
    pub fn is_excluded(&self, value: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(value))
    }
}

fn compile_regex(name: &str, source: &str) -> Result<Regex> {
    RegexBuilder::new(source)
        .size_limit(CUSTOM_SIZE_LIMIT)
        .build()
        .map_err(|e| RedactionError::invalid_pattern(name, format!("regex does not compile: {}", e)))
}

/// Normalize a category label: upper-case, spaces and hyphens become `_`.
pub fn normalize_category(category: &str) -> String {
    category
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
