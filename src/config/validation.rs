// src/config/validation.rs

use crate::config::app::ConfigWarning;
use crate::error::{ConfigError, Result};
use crate::utils::format_duration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

const MAX_UNIX_SOCKET_PERMISSION: u32 = 0o777;
const MIN_MIRROR_INTERVAL: Duration = Duration::from_secs(60);
const FALLBACK_MIRROR_INTERVAL: Duration = Duration::from_secs(8 * 3600);

static MARKUP_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(?-u:\w)").expect("static regex"));

/// Cross-field and format rules applied while deriving the snapshot.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Parses an octal permission such as `666` or `0770`; values above `0777` are rejected.
    pub fn parse_unix_socket_permission(raw: &str) -> Result<u32> {
        let invalid = |reason: &str| {
            ConfigError::invalid_value("server", "UNIX_SOCKET_PERMISSION", raw, reason)
        };
        let parsed = u32::from_str_radix(raw.trim(), 8).map_err(|e| invalid(&format!("not an octal number: {e}")))?;
        if parsed > MAX_UNIX_SOCKET_PERMISSION {
            return Err(invalid("must not exceed 0777"));
        }
        debug!(permission = format!("{parsed:o}"), "Parsed unix socket permission");
        Ok(parsed)
    }

    /// Paths must be written with forward slashes.
    pub fn force_path_separator(path: &str) -> Result<()> {
        if path.contains('\\') {
            return Err(ConfigError::PathSeparator {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Clamps the mirror intervals: the minimum is at least one minute and the
    /// default falls back to 8h when it is below the minimum.
    pub fn check_mirror_intervals(
        min_interval: Duration,
        default_interval: Duration,
        warnings: &mut Vec<ConfigWarning>,
    ) -> (Duration, Duration) {
        let mut min = min_interval;
        let mut default = default_interval;
        if min < MIN_MIRROR_INTERVAL {
            ConfigWarning::MirrorMinIntervalTooLow {
                configured: format_duration(min),
            }
            .emit(warnings);
            min = MIN_MIRROR_INTERVAL;
        }
        if default < min {
            ConfigWarning::MirrorDefaultBelowMin {
                configured: format_duration(default),
            }
            .emit(warnings);
            default = FALLBACK_MIRROR_INTERVAL;
        }
        (min, default)
    }

    /// An external renderer extension must contain a dot followed by an ASCII word character.
    pub fn is_valid_markup_extension(extension: &str) -> bool {
        MARKUP_EXTENSION.is_match(extension)
    }

    /// When the install is locked the configured run user must be the OS user.
    /// The check is skipped on Windows.
    pub fn check_run_user(install_lock: bool, run_user: &str, current_user: &str) -> Result<()> {
        if !install_lock || cfg!(windows) {
            return Ok(());
        }
        if run_user != current_user {
            return Err(ConfigError::RunUserMismatch {
                expected: run_user.to_string(),
                actual: current_user.to_string(),
            });
        }
        Ok(())
    }
}
