// src/config/app.rs

use crate::config::environment::AppPaths;
use crate::config::groups::{
    AdminSettings, ApiSettings, CronSettings, DatabaseSettings, GitSettings, I18nSettings,
    LogRootSettings, MarkdownSettings, MetricsSettings, MirrorSettings, OtherSettings,
    U2fSettings, UiSettings,
};
use crate::config::markup::MarkupParser;
use crate::config::picture::PictureSettings;
use crate::config::repository::{AttachmentSettings, RepositorySettings};
use crate::config::security::SecuritySettings;
use crate::config::server::{LfsSettings, ServerSettings, SshSettings};
use crate::config::source::ConfigSource;
use crate::config::time_format::TimeFormat;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// A condition that degrades or corrects the configuration without stopping the load.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    #[error("Custom config '{path}' not found, ignore this if you're running first time")]
    MissingCustomConfig { path: PathBuf },

    #[error("Failed to load custom conf '{path}' before saving a generated secret: {message}")]
    CustomConfigUnreadable { path: PathBuf, message: String },

    #[error("Failed to enable Let's Encrypt due to Let's Encrypt TOS not being accepted")]
    LetsEncryptTosNotAccepted,

    #[error("LFS server support needs at least Git v2.1.2, found {version}")]
    LfsGitTooOld { version: String },

    #[error("Markup section '{section}' has an empty name and is ignored")]
    MarkupEmptyName { section: String },

    #[error("{section} file extension '{extension}' is invalid. Extension ignored")]
    MarkupInvalidExtension { section: String, extension: String },

    #[error("File extension list is empty, markup {name} ignored")]
    MarkupNoExtensions { name: String },

    #[error("RENDER_COMMAND is empty, markup {name} ignored")]
    MarkupNoRenderCommand { name: String },

    #[error("Mirror.MinInterval is too low ({configured}), using 1m")]
    MirrorMinIntervalTooLow { configured: String },

    #[error("Mirror.DefaultInterval ({configured}) is less than Mirror.MinInterval, using 8h")]
    MirrorDefaultBelowMin { configured: String },

    #[error("Unknown log mode '{mode}' ignored")]
    UnknownLogMode { mode: String },

    #[error("Unknown session provider '{provider}', using memory")]
    UnknownSessionProvider { provider: String },

    #[error("ENABLE_HTML_ALTERNATIVE is deprecated, use SEND_AS_PLAIN_TEXT")]
    DeprecatedHtmlAlternative,

    #[error("Failed to parse Sendmail args: {message}")]
    SendmailArgs { message: String },

    #[error("Register Mail Service: Mail Service is not enabled")]
    RegisterMailWithoutMailer,

    #[error("Notify Mail Service: Mail Service is not enabled")]
    NotifyMailWithoutMailer,
}

impl ConfigWarning {
    /// Logs the warning and records it.
    pub fn emit(self, sink: &mut Vec<ConfigWarning>) {
        warn!(warning = %self, "Configuration warning");
        sink.push(self);
    }
}

/// The fully defaulted configuration snapshot produced by one core load.
///
/// Read-only once loaded; share it by reference or through
/// [`crate::config::global`].
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub paths: AppPaths,
    pub app_name: String,
    pub prod_mode: bool,
    pub run_user: String,
    pub log: LogRootSettings,
    pub server: ServerSettings,
    pub ssh: SshSettings,
    pub lfs: LfsSettings,
    pub security: SecuritySettings,
    pub database: DatabaseSettings,
    pub repository: RepositorySettings,
    pub attachment: AttachmentSettings,
    pub time: TimeFormat,
    pub picture: PictureSettings,
    pub ui: UiSettings,
    pub markdown: MarkdownSettings,
    pub admin: AdminSettings,
    pub cron: CronSettings,
    pub git: GitSettings,
    pub mirror: MirrorSettings,
    pub api: ApiSettings,
    pub u2f: U2fSettings,
    pub metrics: MetricsSettings,
    pub i18n: I18nSettings,
    pub other: OtherSettings,
    pub markup_parsers: Vec<MarkupParser>,
    pub has_robots_txt: bool,
    pub warnings: Vec<ConfigWarning>,
    #[serde(skip)]
    pub(crate) source: ConfigSource,
}

impl Settings {
    /// The merged source the snapshot was derived from.
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }
}
