//! CLI errors and their exit codes.

use crate::exit_codes::ExitCode;
use bugsafe_bundle::BundleError;
use bugsafe_config::ConfigError;
use bugsafe_redact::RedactionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(ConfigError::Io { .. }) => ExitCode::IoError,
            CliError::Config(ConfigError::Redaction(e)) | CliError::Redaction(e) => {
                redaction_exit_code(e)
            }
            CliError::Config(_) => ExitCode::ArgsError,
            CliError::Bundle(e) => bundle_exit_code(e),
            CliError::Read { .. } | CliError::Output(_) => ExitCode::IoError,
            CliError::Input { .. } | CliError::Usage(_) => ExitCode::ArgsError,
        }
    }
}

fn redaction_exit_code(e: &RedactionError) -> ExitCode {
    match e {
        RedactionError::Configuration(_) | RedactionError::InvalidPattern { .. } => {
            ExitCode::ArgsError
        }
        RedactionError::Salt(_) => ExitCode::InternalError,
    }
}

fn bundle_exit_code(e: &BundleError) -> ExitCode {
    match e {
        _ if e.is_security() => ExitCode::IntegrityError,
        BundleError::Zip(_)
        | BundleError::MissingEntry(_)
        | BundleError::NotText { .. }
        | BundleError::Json(_) => ExitCode::IntegrityError,
        BundleError::SelfCheckFailed { .. } => ExitCode::Findings,
        BundleError::Attachment(_) | BundleError::BundleTooLarge { .. } | BundleError::EmptyBundle => {
            ExitCode::ArgsError
        }
        BundleError::Io(_) => ExitCode::IoError,
        BundleError::Redaction(r) => redaction_exit_code(r),
        _ => ExitCode::InternalError,
    }
}
