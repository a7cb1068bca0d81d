//! Snapshot of the current process environment for `pack --capture-env`.
//!
//! Values are captured raw; they are redacted with the rest of the bundle.

use bugsafe_bundle::{Environment, GitInfo};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Variables that indicate a CI runner.
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TF_BUILD",
];

/// Capture the environment of this process.
pub fn capture_environment() -> Environment {
    let cwd = std::env::current_dir().ok();
    let env_vars = std::env::vars().collect();
    let git = cwd.as_deref().and_then(git_info);

    Environment {
        runtime_version: format!("bugsafe {}", env!("CARGO_PKG_VERSION")),
        executable: std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        packages: Vec::new(),
        env_vars,
        cwd: cwd.map(|p| p.display().to_string()).unwrap_or_default(),
        git,
        virtualenv: std::env::var_os("VIRTUAL_ENV").is_some(),
        in_container: detect_container(),
        ci_detected: CI_VARS.iter().any(|v| std::env::var_os(v).is_some()),
    }
}

fn detect_container() -> bool {
    if Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists() {
        return true;
    }
    std::fs::read_to_string("/proc/1/cgroup")
        .map(|c| c.contains("docker") || c.contains("kubepods") || c.contains("containerd"))
        .unwrap_or(false)
}

/// Git metadata for `dir`, or `None` outside a work tree or without git.
pub fn git_info(dir: &Path) -> Option<GitInfo> {
    let commit = git(dir, &["rev-parse", "HEAD"])?;
    let branch = git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]);
    let dirty = git(dir, &["status", "--porcelain"]).map(|s| !s.is_empty());
    let remote_url = git(dir, &["config", "--get", "remote.origin.url"]);

    Some(GitInfo {
        commit: Some(commit),
        branch,
        dirty: dirty.or(Some(false)),
        remote_url,
    })
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| debug!(error = %e, "git unavailable"))
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    Some(text.to_string()).filter(|_| args[0] == "status" || !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_has_platform_and_vars() {
        let env = capture_environment();
        assert!(env.platform.contains(std::env::consts::OS));
        assert!(env.runtime_version.starts_with("bugsafe "));
        assert!(!env.env_vars.is_empty());
    }

    #[test]
    fn test_git_info_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(git_info(dir.path()).is_none());
    }
}
