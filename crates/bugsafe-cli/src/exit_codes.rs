//! Exit codes for the bugsafe CLI.
//!
//! Exit code ranges:
//! - 0-1: Outcomes (clean, residual secrets found)
//! - 10-19: User/input errors (bad arguments, config, hostile bundles)
//! - 20-29: Internal errors

/// Exit codes for bugsafe operations.
///
/// These codes are a stable contract for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success; audits found nothing
    Clean = 0,

    /// Audit or self-check found unredacted secrets
    Findings = 1,

    /// Invalid arguments, configuration or input files
    ArgsError = 10,

    /// Bundle failed integrity or path-safety checks
    IntegrityError = 11,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19 can be fixed by the user.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Findings => "OK_FINDINGS",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::IntegrityError => "ERR_INTEGRITY",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
