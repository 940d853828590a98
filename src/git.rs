//! Probing the external `git` binary.
//!
//! The loader needs the installed git version twice: to decide whether the
//! LFS server can run and whether the credential helper can be disabled.
//! Both checks go through [`GitProbe`] so they can be exercised without a
//! real binary.

use crate::error::{ConfigError, Result};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Source of the installed git version string, e.g. `2.39.2`.
pub trait GitProbe {
    fn bin_version(&self) -> Result<String>;
}

/// Runs `<binary> --version` on the host.
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: PathBuf,
}

impl SystemGit {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitProbe for SystemGit {
    fn bin_version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| ConfigError::GitVersion {
                message: format!("failed to run '{}': {e}", self.binary.display()),
            })?;
        if !output.status.success() {
            return Err(ConfigError::GitVersion {
                message: format!("'{} --version' exited with {}", self.binary.display(), output.status),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_version_output(&stdout).ok_or_else(|| ConfigError::GitVersion {
            message: format!("unexpected version output: {}", stdout.trim()),
        })?;
        debug!(git.version = %version, "Detected git binary version");
        Ok(version)
    }
}

/// A version source that always reports the same version.
#[derive(Debug, Clone)]
pub struct FixedGitVersion(pub String);

impl GitProbe for FixedGitVersion {
    fn bin_version(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Extracts the version from `git version 2.39.2 (Apple Git-143)` style output.
pub fn parse_version_output(output: &str) -> Option<String> {
    let rest = output.trim().strip_prefix("git version ")?;
    let version = rest.split_whitespace().next()?;
    let version = match version.find(".windows") {
        Some(index) => &version[..index],
        None => version,
    };
    Some(version.to_string())
}

fn numeric_components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect()
}

/// Compares dotted versions numerically; missing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = numeric_components(a);
    let right = numeric_components(b);
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// `true` when `version >= minimum`.
pub fn version_at_least(version: &str, minimum: &str) -> bool {
    compare_versions(version, minimum) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_output() {
        assert_eq!(parse_version_output("git version 2.39.2\n").as_deref(), Some("2.39.2"));
        assert_eq!(
            parse_version_output("git version 2.39.2 (Apple Git-143)").as_deref(),
            Some("2.39.2")
        );
        assert_eq!(
            parse_version_output("git version 2.30.1.windows.1").as_deref(),
            Some("2.30.1")
        );
        assert_eq!(parse_version_output("hg 6.1"), None);
    }

    #[test]
    fn test_compare_versions() {
        assert!(version_at_least("2.1.2", "2.1.2"));
        assert!(version_at_least("2.10", "2.9"));
        assert!(!version_at_least("2.1.1", "2.1.2"));
        assert!(!version_at_least("1.9.5", "2.9"));
        assert!(version_at_least("2.9", "2.9.0"));
        assert!(version_at_least("2.20.0-rc1", "2.9"));
    }
}
