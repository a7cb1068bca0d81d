//! Environment variable layer.

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use std::str::FromStr;

pub const ENV_MIN_PRIORITY: &str = "BUGSAFE_MIN_PRIORITY";
pub const ENV_REDACT_EMAILS: &str = "BUGSAFE_REDACT_EMAILS";
pub const ENV_REDACT_IPS: &str = "BUGSAFE_REDACT_IPS";
pub const ENV_REDACT_UUIDS: &str = "BUGSAFE_REDACT_UUIDS";
pub const ENV_TIMEOUT_MS: &str = "BUGSAFE_TIMEOUT_MS";
pub const ENV_DISABLED_CATEGORIES: &str = "BUGSAFE_DISABLED_CATEGORIES";

/// Every variable read by [`env_layer`].
pub const ENV_VARS: &[&str] = &[
    ENV_MIN_PRIORITY,
    ENV_REDACT_EMAILS,
    ENV_REDACT_IPS,
    ENV_REDACT_UUIDS,
    ENV_TIMEOUT_MS,
    ENV_DISABLED_CATEGORIES,
];

/// Build a layer from the process environment.
pub fn env_layer() -> Result<ConfigLayer> {
    env_layer_from(|var| std::env::var(var).ok())
}

/// Build a layer from an arbitrary lookup. Unset and empty variables are
/// ignored; anything unparseable is an error naming the variable.
pub fn env_layer_from<F>(lookup: F) -> Result<ConfigLayer>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
    let mut layer = ConfigLayer::default();
    let r = &mut layer.redaction;

    if let Some(v) = get(ENV_MIN_PRIORITY) {
        r.min_priority = Some(parse_number(ENV_MIN_PRIORITY, &v)?);
    }
    if let Some(v) = get(ENV_REDACT_EMAILS) {
        r.redact_emails = Some(parse_bool(ENV_REDACT_EMAILS, &v)?);
    }
    if let Some(v) = get(ENV_REDACT_IPS) {
        r.redact_ips = Some(parse_bool(ENV_REDACT_IPS, &v)?);
    }
    if let Some(v) = get(ENV_REDACT_UUIDS) {
        r.redact_uuids = Some(parse_bool(ENV_REDACT_UUIDS, &v)?);
    }
    if let Some(v) = get(ENV_TIMEOUT_MS) {
        r.timeout_ms = Some(parse_number(ENV_TIMEOUT_MS, &v)?);
    }
    if let Some(v) = get(ENV_DISABLED_CATEGORIES) {
        r.disabled_categories = Some(
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }

    Ok(layer)
}

/// Parse a boolean flag: `1/true/yes/on` or `0/false/no/off`, any case.
pub fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, value)),
    }
}

fn parse_number<T: FromStr>(var: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid(var, value))
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    }
}
