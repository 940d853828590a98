// src/services/mod.rs

//! Second load phase: settings of the services started after the core load.
//!
//! Every step reads the source kept on [`Settings`], so steps can also be
//! called on their own.

pub mod cache;
pub mod log;
pub mod mailer;
pub mod service;
pub mod webhook;

use crate::config::{ConfigWarning, Settings};
use crate::error::Result;
use serde::Serialize;
use tracing::debug;

pub use cache::{load_cache, load_session, CacheAdapter, CacheSettings, SessionSettings};
pub use log::{load_log, load_persistence_log, LogMode, LogModeConfig, LogSettings};
pub use mailer::{apply_notify_mail, apply_register_mail, load_mailer, MailerSettings};
pub use service::{load_service, ServiceSettings};
pub use webhook::{load_webhook, WebhookSettings};

#[derive(Debug, Clone, Serialize)]
pub struct Services {
    pub service: ServiceSettings,
    pub log: LogSettings,
    pub cache: CacheSettings,
    pub session: SessionSettings,
    /// `None` when the mailer is disabled.
    pub mailer: Option<MailerSettings>,
    pub webhook: WebhookSettings,
    pub warnings: Vec<ConfigWarning>,
}

/// Runs every service step in order.
pub fn load_services(settings: &Settings) -> Result<Services> {
    let mut warnings = Vec::new();

    let mut service = load_service(settings)?;
    let log = load_log(settings, &mut warnings)?;
    let cache = load_cache(settings)?;
    let session = load_session(settings, &mut warnings)?;
    let mailer = load_mailer(settings, &mut warnings)?;
    apply_register_mail(settings, &mut service, mailer.as_ref(), &mut warnings);
    apply_notify_mail(settings, &mut service, mailer.as_ref(), &mut warnings);
    let webhook = load_webhook(settings);

    debug!(warnings = warnings.len(), "Services configured");
    Ok(Services {
        service,
        log,
        cache,
        session,
        mailer,
        webhook,
        warnings,
    })
}
