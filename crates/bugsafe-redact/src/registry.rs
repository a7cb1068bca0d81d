//! Pattern registry: the ordered, filtered set of patterns for one session.

use crate::builtin::builtin_patterns;
use crate::config::PatternConfig;
use crate::error::{RedactionError, Result};
use crate::pattern::{normalize_category, Pattern};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Immutable, priority-ordered pattern set.
///
/// Every built-in and custom pattern is kept; `enabled` records whether the
/// configuration selected it. Only enabled patterns are evaluated.
#[derive(Debug, Clone)]
pub struct Registry {
    patterns: Vec<Pattern>,
}

impl Registry {
    /// Build a registry from a resolved configuration.
    pub fn build(config: &PatternConfig) -> Result<Self> {
        let mut patterns = builtin_patterns();
        let mut seen: HashSet<String> = patterns.iter().map(|p| p.name.clone()).collect();

        for spec in &config.custom_patterns {
            let pattern = Pattern::compile(spec)?;
            if !seen.insert(pattern.name.clone()) {
                return Err(RedactionError::Configuration(format!(
                    "duplicate pattern name '{}'",
                    pattern.name
                )));
            }
            patterns.push(pattern);
        }

        let disabled_categories: HashSet<String> = config
            .disabled_categories
            .iter()
            .map(|c| normalize_category(c))
            .collect();

        for pattern in &mut patterns {
            pattern.enabled = should_apply(pattern, config, &disabled_categories);
        }

        // Stable: ties keep registration order.
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));

        let registry = Self { patterns };
        debug!(
            total = registry.patterns.len(),
            active = registry.active_count(),
            custom = config.custom_patterns.len(),
            "pattern registry built"
        );
        Ok(registry)
    }

    /// Enabled patterns in evaluation order.
    pub fn active(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().filter(|p| p.enabled)
    }

    /// Number of enabled patterns.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// All patterns, enabled or not, in evaluation order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Look up a pattern by name.
    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Categories produced by enabled patterns.
    pub fn active_categories(&self) -> BTreeSet<&str> {
        self.active().map(|p| p.category.as_str()).collect()
    }
}

fn should_apply(
    pattern: &Pattern,
    config: &PatternConfig,
    disabled_categories: &HashSet<String>,
) -> bool {
    if config.disabled_patterns.contains(&pattern.name)
        || disabled_categories.contains(&pattern.category)
    {
        return false;
    }

    match pattern.category.as_str() {
        "EMAIL" if !config.redact_emails => return false,
        "IP_PRIVATE" | "IP_PUBLIC" if !config.redact_ips => return false,
        // Registered at priority 0; the flag alone decides.
        "UUID" => return config.redact_uuids,
        _ => {}
    }

    pattern.priority >= config.min_priority
}
