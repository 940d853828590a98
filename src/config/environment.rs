//! Environment-based path resolution
//!
//! Everything relative in the configuration is resolved against the work
//! path, which is the directory of the executable unless overridden.

use crate::error::{ConfigError, Result};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_WORK_DIR: &str = "GITEA_WORK_DIR";
pub const ENV_CUSTOM: &str = "GITEA_CUSTOM";

/// Environment variables that override path derivation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub work_dir: Option<String>,
    pub custom_path: Option<String>,
}

impl EnvironmentConfig {
    /// Load overrides from environment variables; empty values count as unset.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            work_dir: non_empty(ENV_WORK_DIR),
            custom_path: non_empty(ENV_CUSTOM),
        }
    }

    /// Check if any environment overrides are present
    pub fn has_overrides(&self) -> bool {
        self.work_dir.is_some() || self.custom_path.is_some()
    }

    /// Get a summary of active environment overrides
    pub fn override_summary(&self) -> Vec<String> {
        let mut overrides = Vec::new();
        if self.work_dir.is_some() {
            overrides.push(ENV_WORK_DIR.to_string());
        }
        if self.custom_path.is_some() {
            overrides.push(ENV_CUSTOM.to_string());
        }
        overrides
    }
}

/// Install and custom locations resolved at the start of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPaths {
    /// Absolute path of the running executable.
    pub app_path: PathBuf,
    /// Base for every relative path in the configuration.
    pub work_path: PathBuf,
    /// Directory holding custom templates, `robots.txt` and the config file.
    pub custom_path: PathBuf,
    /// The custom configuration file.
    pub custom_conf: PathBuf,
    /// Where the process id was written, if requested.
    pub custom_pid: Option<PathBuf>,
}

/// Absolute path of the current executable.
pub fn app_path() -> Result<PathBuf> {
    let exe = env::current_exe().map_err(|e| ConfigError::environment("app path", e.to_string()))?;
    Ok(exe.canonicalize().unwrap_or(exe))
}

/// Work path: explicit override, else the executable's directory.
pub fn work_path(app_path: &Path, override_dir: Option<&str>) -> PathBuf {
    match override_dir {
        Some(dir) => PathBuf::from(dir),
        None => app_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| app_path.to_path_buf()),
    }
}

/// Custom directory: override (relative ones live under the work path), else `<work>/custom`.
pub fn custom_path(work_path: &Path, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => resolve_against(work_path, path),
        None => work_path.join("custom"),
    }
}

/// Custom config file: explicit path (relative ones live under the custom dir), else `<custom>/conf/app.ini`.
pub fn custom_conf(custom_path: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => resolve_against(custom_path, path),
        None => custom_path.join("conf").join("app.ini"),
    }
}

/// Joins `path` onto `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Home directory of the OS user running the process.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ConfigError::environment("home directory", "no home directory for current user"))
}

/// Name of the OS user running the process.
#[cfg(unix)]
pub fn current_username() -> String {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => user.name,
        _ => env::var("USER").unwrap_or_default(),
    }
}

/// Name of the OS user running the process.
#[cfg(not(unix))]
pub fn current_username() -> String {
    env::var("USERNAME").or_else(|_| env::var("USER")).unwrap_or_default()
}
