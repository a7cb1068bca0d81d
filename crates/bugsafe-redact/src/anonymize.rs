//! Path anonymization.
//!
//! Rewrites machine-specific path fragments (project root, virtualenvs,
//! install dirs, temp dirs, home directory, usernames) to fixed placeholders.
//! Runs after tokenization; no rule consumes `<` or `>`, so tokens survive.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Placeholders emitted by the anonymizer. The matcher treats `<NAME>` for
/// each of these as already redacted.
pub const PLACEHOLDERS: &[&str] = &["PROJECT", "VENV", "SITE_PACKAGES", "TMPDIR", "USER", "UID"];

/// A path followed by a segment boundary. Group 1 is re-emitted.
const BOUNDARY: &str = r"([^A-Za-z0-9._\-]|$)";

static VENV_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[/\\]\.?venv[/\\]lib[/\\]python[0-9]+\.[0-9]+[/\\]",
        r"[/\\]\.virtualenvs[/\\][^/\\\s<>]+[/\\]lib[/\\]python[0-9]+\.[0-9]+[/\\]",
        r"[/\\]envs[/\\][^/\\\s<>]+[/\\]lib[/\\]python[0-9]+\.[0-9]+[/\\]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SITE_PACKAGES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([/\\])(?:site-packages|dist-packages)[/\\]").unwrap());

static TEMP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/private/var/folders/[^/\s<>]+/[^/\s<>]+/[^/\s<>]+",
        r"/var/folders/[^/\s<>]+/[^/\s<>]+/[^/\s<>]+",
        r"/tmp/pytest-of-[^/\s<>]+",
        r"/tmp/[^/\s<>]+",
        r"(?i)C:\\Users\\[^\\\s<>]+\\AppData\\Local\\Temp\\[^\\\s<>]+",
        r"(?i)C:\\Windows\\Temp\\[^\\\s<>]+",
        r"/run/user/[0-9]+/[^/\s<>]+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RUN_USER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/run/user/[0-9]+([^0-9]|$)").unwrap());

/// Which rewrites are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizerOptions {
    /// Replaced with `<PROJECT>` when set.
    pub project_root: Option<PathBuf>,
    pub home: bool,
    pub username: bool,
    pub temp: bool,
    pub site_packages: bool,
    pub venv: bool,
}

impl Default for AnonymizerOptions {
    fn default() -> Self {
        Self {
            project_root: None,
            home: true,
            username: true,
            temp: true,
            site_packages: true,
            venv: true,
        }
    }
}

impl AnonymizerOptions {
    /// Set the project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Turn every rule off.
    pub fn disabled() -> Self {
        Self {
            project_root: None,
            home: false,
            username: false,
            temp: false,
            site_packages: false,
            venv: false,
        }
    }
}

/// Home directory and login name of the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub home: Option<PathBuf>,
    pub username: Option<String>,
}

impl Identity {
    /// Detect from the environment.
    pub fn current() -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.trim().is_empty());
        Self {
            home: dirs::home_dir(),
            username,
        }
    }
}

struct Rule {
    regex: Regex,
    replacement: String,
}

/// Ordered path rewrites.
pub struct PathAnonymizer {
    rules: Vec<Rule>,
}

impl PathAnonymizer {
    /// Build with the current user's identity.
    pub fn new(options: AnonymizerOptions) -> Self {
        Self::with_identity(options, Identity::current())
    }

    /// Build with an explicit identity.
    pub fn with_identity(options: AnonymizerOptions, identity: Identity) -> Self {
        let mut rules = Vec::new();

        if let Some(root) = options.project_root.as_deref().and_then(path_literal) {
            rules.extend(literal_rule(&root, "<PROJECT>"));
        }

        if options.venv {
            for re in VENV_PATTERNS.iter() {
                rules.push(Rule {
                    regex: re.clone(),
                    replacement: "/<VENV>/".to_string(),
                });
            }
        }

        if options.site_packages {
            rules.push(Rule {
                regex: SITE_PACKAGES_PATTERN.clone(),
                replacement: "${1}<SITE_PACKAGES>${1}".to_string(),
            });
        }

        if options.temp {
            for re in TEMP_PATTERNS.iter() {
                rules.push(Rule {
                    regex: re.clone(),
                    replacement: "<TMPDIR>".to_string(),
                });
            }
        }

        if options.home {
            if let Some(home) = identity.home.as_deref().and_then(path_literal) {
                rules.extend(literal_rule(&home, "~"));
            }
        }

        if options.username {
            if let Some(user) = identity.username.as_deref().filter(|u| !u.is_empty()) {
                let user = regex::escape(user);
                for (prefix, replacement) in [
                    (r"/home/", "/home/<USER>${1}"),
                    (r"/Users/", "/Users/<USER>${1}"),
                    (r"\\Users\\", r"\Users\<USER>${1}"),
                ] {
                    let source = format!(r"{}{}{}", prefix, user, BOUNDARY);
                    if let Ok(regex) = Regex::new(&source) {
                        rules.push(Rule {
                            regex,
                            replacement: replacement.to_string(),
                        });
                    }
                }
            }
            rules.push(Rule {
                regex: RUN_USER_PATTERN.clone(),
                replacement: "/run/user/<UID>${1}".to_string(),
            });
        }

        Self { rules }
    }

    /// Apply every enabled rule in order.
    pub fn anonymize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut result = Cow::Borrowed(text);
        for rule in &self.rules {
            let replaced = match rule.regex.replace_all(&result, rule.replacement.as_str()) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                result = Cow::Owned(s);
            }
        }
        result
    }

    /// Anonymize a single path.
    pub fn anonymize_path(&self, path: &Path) -> String {
        self.anonymize(&path.to_string_lossy()).into_owned()
    }

    /// Number of active rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for PathAnonymizer {
    fn default() -> Self {
        Self::new(AnonymizerOptions::default())
    }
}

impl std::fmt::Debug for PathAnonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathAnonymizer")
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// A path usable as a literal rule: non-root, trailing separators trimmed.
fn path_literal(path: &Path) -> Option<String> {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches(&['/', '\\'][..]);
    (trimmed.len() > 1).then(|| trimmed.to_string())
}

fn literal_rule(literal: &str, placeholder: &str) -> Option<Rule> {
    let source = format!("{}{}", regex::escape(literal), BOUNDARY);
    Some(Rule {
        regex: Regex::new(&source).ok()?,
        replacement: format!("{}${{1}}", placeholder),
    })
}
