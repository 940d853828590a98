//! Error handling for configuration loading
//!
//! Every condition that must stop the service from starting is a
//! [`ConfigError`]. The library never terminates the process itself; the
//! binary (or any embedding application) decides what to do with the error.
//! Conditions that only degrade a feature are reported as
//! [`crate::config::ConfigWarning`] instead.

use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Main configuration error type with categorization by failing concern
#[derive(Error, Debug)]
pub enum ConfigError {
    // Source file errors
    #[error("Failed to load custom config '{path}': {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("IO operation failed: {operation} '{path}' - {source}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Value validation errors
    #[error("Invalid value for [{section}] {key} = '{value}': {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Do not use '\\' or '\\\\' in paths, use '/' instead: {path}")]
    PathSeparator { path: String },

    #[error("Can't create time properly from '{layout}', the format must contain 2006, 01, 02, 15, 04 and 05")]
    TimeFormat { layout: String },

    #[error("Unknown log level: {level}")]
    UnknownLogLevel { level: String },

    #[error("Unknown cache adapter: {adapter}")]
    UnknownCacheAdapter { adapter: String },

    #[error("Invalid OpenID pattern '{pattern}' in {list}: {source}")]
    InvalidRegex {
        list: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid mailer.FROM ({address}): {reason}")]
    InvalidMailAddress { address: String, reason: String },

    // Environment errors
    #[error("Expect user '{expected}' but current user is: {actual}")]
    RunUserMismatch { expected: String, actual: String },

    #[error("Failed to resolve {what}: {message}")]
    Environment { what: String, message: String },

    #[error("Error saving generated {key} to custom config '{path}': {message}")]
    SecretPersistence {
        key: String,
        path: PathBuf,
        message: String,
    },

    #[error("Error retrieving git version: {message}")]
    GitVersion { message: String },
}

impl ConfigError {
    /// Create an invalid value error for a section key
    pub fn invalid_value(
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section: section.into(),
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error bound to the path and the operation that failed
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    pub fn environment(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Stable category name, used as a structured log field
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } | Self::Io { .. } => "source",
            Self::InvalidValue { .. }
            | Self::PathSeparator { .. }
            | Self::TimeFormat { .. }
            | Self::UnknownLogLevel { .. }
            | Self::UnknownCacheAdapter { .. }
            | Self::InvalidRegex { .. }
            | Self::InvalidMailAddress { .. } => "validation",
            Self::RunUserMismatch { .. } | Self::Environment { .. } => "environment",
            Self::SecretPersistence { .. } => "secret",
            Self::GitVersion { .. } => "git",
        }
    }

    /// Log the error at error level with its category
    pub fn log(&self) {
        error!(
            error = %self,
            error.category = self.category(),
            "Configuration could not be loaded"
        );
    }
}

/// Result type alias for the crate
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
