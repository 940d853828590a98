//! The process-wide configuration instance.
//!
//! The binary loads the configuration once at startup and publishes it here;
//! everything afterwards only reads it.

use crate::config::app::Settings;
use crate::error::{ConfigError, Result};
use once_cell::sync::OnceCell;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Publishes the loaded settings. Only the first call succeeds.
pub fn init(settings: Settings) -> Result<&'static Settings> {
    SETTINGS
        .set(settings)
        .map_err(|_| ConfigError::environment("global settings", "settings are already initialized"))?;
    get().ok_or_else(|| ConfigError::environment("global settings", "settings vanished after initialization"))
}

/// The published settings, if [`init`] ran.
pub fn get() -> Option<&'static Settings> {
    SETTINGS.get()
}
