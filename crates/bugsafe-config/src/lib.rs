//! bugsafe configuration loading.
//!
//! This crate provides:
//! - TOML config layers (`.bugsafe.toml`, user config file)
//! - `BUGSAFE_*` environment overrides
//! - Layered resolution (defaults → project → user → env → CLI) with
//!   per-key provenance
//! - The `config --init` template

pub mod env;
pub mod error;
pub mod layer;
pub mod resolve;
pub mod template;

pub use env::{env_layer, env_layer_from, parse_bool, ENV_VARS};
pub use error::{ConfigError, Result};
pub use layer::{BundleLayer, ConfigLayer, RedactionLayer};
pub use resolve::{
    default_user_config_path, discover, load, BundleSettings, ConfigBuilder, ConfigPaths,
    ConfigSource, LoadOptions, ResolvedConfig, ENV_CONFIG_PATH, ENV_PROJECT_CONFIG_PATH,
    PROJECT_CONFIG_FILENAME,
};
pub use template::{init_config, DEFAULT_CONFIG_TEMPLATE};
