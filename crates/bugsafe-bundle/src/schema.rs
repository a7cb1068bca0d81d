//! Content entries of a bundle: traceback, environment, command and output.
//!
//! Each type has a `redacted` method that pushes every free-text field through
//! one [`RedactionSession`], so the same secret gets the same token whether it
//! appears in a frame local, an environment variable or stdout.

use bugsafe_redact::RedactionSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TRACEBACK_FILE_NAME: &str = "traceback.json";
pub const ENVIRONMENT_FILE_NAME: &str = "environment.json";
pub const OUTPUT_FILE_NAME: &str = "output.txt";
pub const STDERR_FILE_NAME: &str = "stderr.txt";
pub const COMMAND_FILE_NAME: &str = "command.json";
pub const ATTACHMENTS_DIR: &str = "attachments/";

/// A single stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locals: Option<BTreeMap<String, String>>,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            function: None,
            code: None,
            locals: None,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.locals
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Redact the file path, source line and locals.
    ///
    /// Locals are redacted as `name=value` spans, like environment variables.
    pub fn redacted(&self, session: &mut RedactionSession) -> Self {
        Self {
            file: session.redact(&self.file),
            line: self.line,
            function: self.function.clone(),
            code: self.code.as_deref().map(|c| session.redact(c)),
            locals: self.locals.as_ref().map(|l| session.redact_env(l)),
        }
    }
}

/// A structured exception with its frames and chained causes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traceback {
    pub exception_type: String,
    pub message: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chained: Vec<Traceback>,
}

impl Traceback {
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_type: exception_type.into(),
            message: message.into(),
            frames: Vec::new(),
            chained: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn with_chained(mut self, cause: Traceback) -> Self {
        self.chained.push(cause);
        self
    }

    pub fn redacted(&self, session: &mut RedactionSession) -> Self {
        Self {
            exception_type: self.exception_type.clone(),
            message: session.redact(&self.message),
            frames: self.frames.iter().map(|f| f.redacted(session)).collect(),
            chained: self.chained.iter().map(|t| t.redacted(session)).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl GitInfo {
    pub fn redacted(&self, session: &mut RedactionSession) -> Self {
        Self {
            commit: self.commit.as_deref().map(|c| session.redact(c)),
            branch: self.branch.as_deref().map(|b| session.redact(b)),
            dirty: self.dirty,
            remote_url: self.remote_url.as_deref().map(|u| session.redact(u)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

/// Snapshot of the environment the failing command ran in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub runtime_version: String,
    pub executable: String,
    pub platform: String,
    pub packages: Vec<PackageInfo>,
    pub env_vars: BTreeMap<String, String>,
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    pub virtualenv: bool,
    pub in_container: bool,
    pub ci_detected: bool,
}

impl Environment {
    /// Redact paths, variables and git metadata. Package names and versions
    /// are kept as-is.
    pub fn redacted(&self, session: &mut RedactionSession) -> Self {
        Self {
            runtime_version: self.runtime_version.clone(),
            executable: session.redact(&self.executable),
            platform: self.platform.clone(),
            packages: self.packages.clone(),
            env_vars: session.redact_env(&self.env_vars),
            cwd: session.redact(&self.cwd),
            git: self.git.as_ref().map(|g| g.redacted(session)),
            virtualenv: self.virtualenv,
            in_container: self.in_container,
            ci_detected: self.ci_detected,
        }
    }
}

/// How the captured command ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandRecord {
    pub command: Vec<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub timed_out: bool,
    pub truncated: bool,
}

impl CommandRecord {
    pub fn new<S: Into<String>>(command: impl IntoIterator<Item = S>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn redacted(&self, session: &mut RedactionSession) -> Self {
        Self {
            command: session.redact_all(&self.command),
            ..self.clone()
        }
    }
}
