//! Starter config file written by `bugsafe config --init`.

use crate::error::{ConfigError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Commented template. Every setting is commented out, so the file parses to
/// an empty layer until edited.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# bugsafe configuration
#
# Precedence, lowest to highest: built-in defaults, project file
# (.bugsafe.toml), this file, BUGSAFE_* environment variables, CLI flags.

[redaction]
# Patterns below this priority are skipped (0-100).
# min_priority = 60

# disabled_categories = ["HOSTNAME"]
# disabled_patterns = ["generic_api_key"]

# redact_emails = true
# redact_ips = true
# redact_uuids = false

# Per-pattern evaluation deadline in milliseconds; 0 disables it.
# timeout_ms = 100

# [[redaction.custom_patterns]]
# name = "internal_ticket"
# regex = "TICKET-[0-9]{6}"
# category = "TICKET"
# priority = 80
# capture_group = 0

[bundle]
# max_entry_bytes = 52428800
# max_total_bytes = 52428800
"#;

/// Write the template to `path`, creating parent directories. Never
/// overwrites an existing file.
pub fn init_config(path: &Path) -> Result<()> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(io_err(e)),
    };
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
        .map_err(io_err)?;

    info!(path = %path.display(), "Config template written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ConfigLayer;

    #[test]
    fn test_template_parses_to_empty_layer() {
        let layer = ConfigLayer::from_toml(DEFAULT_CONFIG_TEMPLATE, Path::new("template")).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_template_uncommented_parses() {
        let uncommented: String = DEFAULT_CONFIG_TEMPLATE
            .lines()
            .map(|l| match l.strip_prefix("# ") {
                Some(rest) if rest.contains(" = ") || rest.starts_with("[[") => rest,
                _ => l,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let layer = ConfigLayer::from_toml(&uncommented, Path::new("template")).unwrap();
        assert_eq!(layer.redaction.min_priority, Some(60));
        assert_eq!(layer.redaction.custom_patterns.len(), 1);
        assert_eq!(layer.bundle.max_total_bytes, Some(52_428_800));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_config(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);

        let err = init_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    }
}
