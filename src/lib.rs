// src/lib.rs

//! Configuration loading for a self-hosted Git service.
//!
//! [`load_core`] turns the custom `app.ini` into a fully defaulted
//! [`Settings`] snapshot, [`load_services`] derives the settings of the
//! services started afterwards. Both return a [`ConfigError`] instead of
//! terminating the process.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod services;
pub mod utils;

pub use config::{check_lfs_version, load_core, ConfigWarning, LoadOptions, Settings};
pub use error::{ConfigError, Result};
pub use git::{GitProbe, SystemGit};
pub use services::{load_services, Services};

/// Runs the whole startup sequence: core load, LFS version check and services.
pub fn load(options: &LoadOptions, git: &dyn GitProbe) -> Result<(Settings, Services)> {
    let mut settings = load_core(options, git)?;
    check_lfs_version(&mut settings, git)?;
    let services = load_services(&settings)?;
    Ok((settings, services))
}
