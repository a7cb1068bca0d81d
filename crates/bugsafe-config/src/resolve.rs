//! Configuration file discovery and layered resolution.
//!
//! Resolution order, later wins: built-in defaults → project file → user file
//! → environment → CLI overrides.

use crate::env::env_layer;
use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use bugsafe_bundle::{ReadLimits, WriteLimits, MAX_BUNDLE_SIZE};
use bugsafe_redact::{PatternConfig, Priority, Registry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Explicit user config file.
pub const ENV_CONFIG_PATH: &str = "BUGSAFE_CONFIG";

/// Explicit project config file.
pub const ENV_PROJECT_CONFIG_PATH: &str = "BUGSAFE_PROJECT_CONFIG";

/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = ".bugsafe.toml";

pub const USER_CONFIG_FILENAME: &str = "config.toml";

/// Application name for platform config directories.
const APP_NAME: &str = "bugsafe";

/// Where a setting came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    #[default]
    BuiltinDefault,
    ProjectFile(PathBuf),
    UserFile(PathBuf),
    Environment,
    CliArgument,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
            ConfigSource::ProjectFile(p) => write!(f, "project file {}", p.display()),
            ConfigSource::UserFile(p) => write!(f, "user file {}", p.display()),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::CliArgument => write!(f, "CLI argument"),
        }
    }
}

/// Discovered configuration file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    pub project: Option<PathBuf>,
    pub user: Option<PathBuf>,
}

/// Find the project and user config files.
///
/// An explicitly named file (`explicit_user`, `$BUGSAFE_CONFIG`,
/// `$BUGSAFE_PROJECT_CONFIG`) is returned even when missing so that loading
/// it reports the error; default locations are skipped when absent.
pub fn discover(explicit_user: Option<&Path>, cwd: &Path) -> ConfigPaths {
    let project = match std::env::var_os(ENV_PROJECT_CONFIG_PATH) {
        Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => Some(cwd.join(PROJECT_CONFIG_FILENAME)).filter(|p| p.is_file()),
    };

    let user = match explicit_user {
        Some(p) => Some(p.to_path_buf()),
        None => match std::env::var_os(ENV_CONFIG_PATH) {
            Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
            _ => default_user_config_path().filter(|p| p.is_file()),
        },
    };

    ConfigPaths { project, user }
}

/// `<platform config dir>/bugsafe/config.toml`.
pub fn default_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(USER_CONFIG_FILENAME))
}

/// Bundle size limits after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BundleSettings {
    pub max_entry_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            max_entry_bytes: MAX_BUNDLE_SIZE,
            max_total_bytes: MAX_BUNDLE_SIZE,
        }
    }
}

impl BundleSettings {
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            max_entry_bytes: self.max_entry_bytes,
            max_total_bytes: self.max_total_bytes,
            ..Default::default()
        }
    }

    pub fn write_limits(&self) -> WriteLimits {
        WriteLimits {
            max_total_bytes: self.max_total_bytes,
            max_attachment_bytes: WriteLimits::default()
                .max_attachment_bytes
                .min(self.max_entry_bytes),
            ..Default::default()
        }
    }
}

/// Fully resolved configuration with per-key provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub redaction: PatternConfig,
    pub bundle: BundleSettings,
    /// Dotted key (e.g. `redaction.min_priority`) to the layer that set it.
    /// Keys left at their default are absent.
    pub provenance: BTreeMap<String, ConfigSource>,
}

impl ResolvedConfig {
    /// Source of a dotted key.
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.provenance.get(key).cloned().unwrap_or_default()
    }

    /// Compile the pattern registry for these settings.
    pub fn registry(&self) -> Result<Registry> {
        Ok(Registry::build(&self.redaction)?)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct View<'a> {
            redaction: &'a PatternConfig,
            bundle: &'a BundleSettings,
        }
        Ok(toml::to_string_pretty(&View {
            redaction: &self.redaction,
            bundle: &self.bundle,
        })?)
    }
}

/// Merges layers in the order they are added.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    layers: Vec<(ConfigSource, ConfigLayer)>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer; it overrides every earlier layer.
    pub fn layer(mut self, source: ConfigSource, layer: ConfigLayer) -> Self {
        self.layers.push((source, layer));
        self
    }

    /// Merge all layers onto the defaults and validate the result by building
    /// a registry from it.
    pub fn build(self) -> Result<ResolvedConfig> {
        let mut redaction = PatternConfig::default();
        let mut bundle = BundleSettings::default();
        let mut provenance = BTreeMap::new();

        for (source, layer) in self.layers {
            let mut set = |key: &str| {
                provenance.insert(key.to_string(), source.clone());
            };
            let r = layer.redaction;

            if let Some(v) = r.min_priority {
                if v > Priority::CRITICAL {
                    return Err(ConfigError::OutOfRange {
                        key: "redaction.min_priority".to_string(),
                        value: i64::from(v),
                        min: i64::from(Priority::DISABLED),
                        max: i64::from(Priority::CRITICAL),
                        origin: source.clone(),
                    });
                }
                redaction.min_priority = v;
                set("redaction.min_priority");
            }
            if let Some(v) = r.disabled_categories {
                redaction.disabled_categories = v.into_iter().collect();
                set("redaction.disabled_categories");
            }
            if let Some(v) = r.disabled_patterns {
                redaction.disabled_patterns = v.into_iter().collect();
                set("redaction.disabled_patterns");
            }
            if let Some(v) = r.redact_emails {
                redaction.redact_emails = v;
                set("redaction.redact_emails");
            }
            if let Some(v) = r.redact_ips {
                redaction.redact_ips = v;
                set("redaction.redact_ips");
            }
            if let Some(v) = r.redact_uuids {
                redaction.redact_uuids = v;
                set("redaction.redact_uuids");
            }
            if let Some(v) = r.timeout_ms {
                redaction.timeout_ms = v;
                set("redaction.timeout_ms");
            }
            for spec in r.custom_patterns {
                set(&format!("redaction.custom_patterns.{}", spec.name));
                match redaction
                    .custom_patterns
                    .iter_mut()
                    .find(|p| p.name == spec.name)
                {
                    Some(existing) => *existing = spec,
                    None => redaction.custom_patterns.push(spec),
                }
            }

            if let Some(v) = layer.bundle.max_entry_bytes {
                bundle.max_entry_bytes = v;
                set("bundle.max_entry_bytes");
            }
            if let Some(v) = layer.bundle.max_total_bytes {
                bundle.max_total_bytes = v;
                set("bundle.max_total_bytes");
            }
        }

        Registry::build(&redaction)?;

        debug!(
            min_priority = redaction.min_priority,
            custom_patterns = redaction.custom_patterns.len(),
            overridden = provenance.len(),
            "Configuration resolved"
        );

        Ok(ResolvedConfig {
            redaction,
            bundle,
            provenance,
        })
    }
}

/// Inputs to [`load`] that do not come from files or the environment.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// `--config` path; replaces the user file lookup.
    pub config_path: Option<PathBuf>,
    /// Directory searched for `.bugsafe.toml`.
    pub cwd: Option<PathBuf>,
    /// Command-line overrides.
    pub cli: ConfigLayer,
}

/// Resolve configuration from every layer.
pub fn load(options: &LoadOptions) -> Result<ResolvedConfig> {
    let cwd = match &options.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?,
    };
    let paths = discover(options.config_path.as_deref(), &cwd);

    let mut builder = ConfigBuilder::new();
    if let Some(path) = &paths.project {
        builder = builder.layer(
            ConfigSource::ProjectFile(path.clone()),
            ConfigLayer::load(path)?,
        );
    }
    if let Some(path) = &paths.user {
        builder = builder.layer(ConfigSource::UserFile(path.clone()), ConfigLayer::load(path)?);
    }
    builder = builder
        .layer(ConfigSource::Environment, env_layer()?)
        .layer(ConfigSource::CliArgument, options.cli.clone());

    builder.build()
}
