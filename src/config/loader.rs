// src/config/loader.rs

use crate::config::app::{ConfigWarning, Settings};
use crate::config::environment::{self, AppPaths, EnvironmentConfig};
use crate::config::groups::{
    AdminSettings, ApiSettings, CronSettings, DatabaseSettings, GitSettings, I18nSettings,
    LogRootSettings, MarkdownSettings, MetricsSettings, MirrorSettings, OtherSettings,
    U2fSettings, UiSettings,
};
use crate::config::markup::load_markup_parsers;
use crate::config::picture::PictureSettings;
use crate::config::repository::{AttachmentSettings, RepositorySettings};
use crate::config::security::load_security;
use crate::config::server::{load_lfs, load_server, load_ssh};
use crate::config::source::{ConfigSource, DEFAULT_SECTION};
use crate::config::time_format::{TimeFormat, DEFAULT_FORMAT};
use crate::config::validation::ConfigValidator;
use crate::error::{ConfigError, Result};
use crate::git::{version_at_least, GitProbe};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

pub const DEFAULT_APP_NAME: &str = "Gitea: Git with a cup of tea";

/// Minimum git version for the built-in LFS server.
pub const LFS_MIN_GIT_VERSION: &str = "2.1.2";

/// From this version on git accepts an empty `credential.helper`.
pub const CREDENTIAL_HELPER_MIN_GIT_VERSION: &str = "2.9";

/// Inputs of a core load that normally come from the process environment.
///
/// Every `None` falls back to the real environment, so tests can make a load
/// hermetic by setting all of them.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub app_path: Option<PathBuf>,
    pub work_path: Option<PathBuf>,
    pub custom_path: Option<PathBuf>,
    pub custom_conf: Option<PathBuf>,
    pub custom_pid: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub current_user: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with `GITEA_WORK_DIR` and `GITEA_CUSTOM` applied.
    pub fn from_env() -> Self {
        let env = EnvironmentConfig::from_env();
        if env.has_overrides() {
            debug!(overrides = ?env.override_summary(), "Environment overrides active");
        }
        Self {
            work_path: env.work_dir.map(PathBuf::from),
            custom_path: env.custom_path.map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn with_app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_path = Some(path.into());
        self
    }

    pub fn with_work_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_path = Some(path.into());
        self
    }

    pub fn with_custom_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_path = Some(path.into());
        self
    }

    pub fn with_custom_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_conf = Some(path.into());
        self
    }

    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_pid = Some(path.into());
        self
    }

    pub fn with_home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(path.into());
        self
    }

    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    pub fn with_current_user(mut self, user: impl Into<String>) -> Self {
        self.current_user = Some(user.into());
        self
    }

    fn resolve_paths(&self) -> Result<AppPaths> {
        let env = EnvironmentConfig::from_env();
        let app_path = match &self.app_path {
            Some(path) => path.clone(),
            None => environment::app_path()?,
        };
        let work_path = match &self.work_path {
            Some(path) => path.clone(),
            None => environment::work_path(&app_path, env.work_dir.as_deref()),
        };
        let custom_override = self.custom_path.clone().or_else(|| env.custom_path.map(PathBuf::from));
        let custom_path = environment::custom_path(&work_path, custom_override.as_deref());
        let custom_conf = environment::custom_conf(&custom_path, self.custom_conf.as_deref());
        Ok(AppPaths {
            app_path,
            work_path,
            custom_path,
            custom_conf,
            custom_pid: self.custom_pid.clone(),
        })
    }
}

/// Writes the current process id to `path`, creating parent directories.
pub fn create_pid_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io("create PID folder", parent, e))?;
    }
    fs::write(path, process::id().to_string()).map_err(|e| ConfigError::io("write PID file", path, e))?;
    debug!(pid.path = %path.display(), "Wrote PID file");
    Ok(())
}

/// Stores a freshly generated secret in the custom config file.
///
/// The file is re-read, the key is set and the whole file is written back.
/// This read-modify-write is not synchronized: it must run at most once per
/// key from a single thread during startup.
pub fn persist_generated_secret(
    custom_conf: &Path,
    section: &str,
    key: &str,
    value: &str,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<()> {
    let persistence_error = |message: String| ConfigError::SecretPersistence {
        key: key.to_string(),
        path: custom_conf.to_path_buf(),
        message,
    };

    let mut saved = ConfigSource::new();
    if custom_conf.is_file() {
        if let Err(e) = saved.append_file(custom_conf) {
            ConfigWarning::CustomConfigUnreadable {
                path: custom_conf.to_path_buf(),
                message: e.to_string(),
            }
            .emit(warnings);
        }
    }
    saved.set(section, key, value);

    if let Some(parent) = custom_conf.parent() {
        fs::create_dir_all(parent).map_err(|e| persistence_error(e.to_string()))?;
    }
    saved
        .save_to(custom_conf)
        .map_err(|e| persistence_error(e.to_string()))?;
    debug!(config.path = %custom_conf.display(), secret.key = key, "Saved generated secret");
    Ok(())
}

/// Runs the core load: resolves paths, reads the custom config file and
/// derives every configuration group.
///
/// May write the PID file and persist generated secrets into the custom
/// config file as a side effect.
pub fn load_core(options: &LoadOptions, git: &dyn GitProbe) -> Result<Settings> {
    let paths = options.resolve_paths()?;
    debug!(
        app.path = %paths.app_path.display(),
        work.path = %paths.work_path.display(),
        custom.path = %paths.custom_path.display(),
        "Resolved application paths"
    );

    if let Some(pid) = &paths.custom_pid {
        create_pid_file(pid)?;
    }

    let mut warnings = Vec::new();
    let source = if paths.custom_conf.is_file() {
        ConfigSource::from_file(&paths.custom_conf)?
    } else {
        ConfigWarning::MissingCustomConfig {
            path: paths.custom_conf.clone(),
        }
        .emit(&mut warnings);
        ConfigSource::new()
    };

    let home_dir = match &options.home_dir {
        Some(dir) => dir.clone(),
        None => environment::home_dir()?,
    };
    let temp_dir = options.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
    let current_user = options
        .current_user
        .clone()
        .unwrap_or_else(environment::current_username);

    let log = LogRootSettings::from_source(&source, &paths.work_path)?;

    let root = source.section(DEFAULT_SECTION);
    let app_name = root.key("APP_NAME").must_string(DEFAULT_APP_NAME);
    let prod_mode = root.key("RUN_MODE").string().eq_ignore_ascii_case("prod");
    let run_user = root.key("RUN_USER").must_string(&current_user);

    let server = load_server(&source, &paths, &mut warnings)?;
    let ssh = load_ssh(&source, &server, &home_dir, &temp_dir, &run_user)?;
    let lfs = load_lfs(&source, &server, &paths, &mut warnings)?;
    let security = load_security(&source, &paths.custom_conf, &mut warnings)?;
    let database = DatabaseSettings::from_source(&source);
    let attachment = AttachmentSettings::from_source(&source, &server.app_data_path, &paths.work_path);
    let time = TimeFormat::from_config(&source.section("time").key("FORMAT").must_string(DEFAULT_FORMAT))?;

    ConfigValidator::check_run_user(security.install_lock, &run_user, &current_user)?;

    let repository = RepositorySettings::from_source(&source, &home_dir, &paths.work_path)?;
    let picture = PictureSettings::from_source(
        &source,
        &server.app_data_path,
        &paths.work_path,
        server.offline_mode,
        security.install_lock,
    )?;

    let ui = UiSettings::from_source(&source);
    let markdown = MarkdownSettings::from_source(&source);
    let admin = AdminSettings::from_source(&source);
    let cron = CronSettings::from_source(&source);
    let mut git_settings = GitSettings::from_source(&source);
    let api = ApiSettings::from_source(&source);
    let metrics = MetricsSettings::from_source(&source);
    let mirror = MirrorSettings::from_source(&source, &mut warnings);
    let i18n = I18nSettings::from_source(&source);
    let other = OtherSettings::from_source(&source);
    let has_robots_txt = paths.custom_path.join("robots.txt").is_file();
    let markup_parsers = load_markup_parsers(&source, &mut warnings);
    let u2f = U2fSettings::from_source(&source, server.root_url.trim_end_matches('/'));

    let version = git.bin_version()?;
    if version_at_least(&version, CREDENTIAL_HELPER_MIN_GIT_VERSION) {
        git_settings
            .global_command_args
            .extend(["-c", "credential.helper="].map(String::from));
    }
    git_settings.version = Some(version);

    info!(
        app.name = %app_name,
        server.root_url = %server.root_url,
        config.path = %paths.custom_conf.display(),
        warnings = warnings.len(),
        "Configuration loaded"
    );

    Ok(Settings {
        paths,
        app_name,
        prod_mode,
        run_user,
        log,
        server,
        ssh,
        lfs,
        security,
        database,
        repository,
        attachment,
        time,
        picture,
        ui,
        markdown,
        admin,
        cron,
        git: git_settings,
        mirror,
        api,
        u2f,
        metrics,
        i18n,
        other,
        markup_parsers,
        has_robots_txt,
        warnings,
        source,
    })
}

/// Disables the LFS server when git is too old for it, otherwise turns off
/// the LFS filters of the user's git configuration for server-side commands.
pub fn check_lfs_version(settings: &mut Settings, git: &dyn GitProbe) -> Result<()> {
    if !settings.lfs.start_server {
        return Ok(());
    }

    let version = git.bin_version()?;
    if !version_at_least(&version, LFS_MIN_GIT_VERSION) {
        settings.lfs.start_server = false;
        ConfigWarning::LfsGitTooOld { version }.emit(&mut settings.warnings);
        return Ok(());
    }

    settings.git.global_command_args.extend(
        [
            "-c",
            "filter.lfs.required=",
            "-c",
            "filter.lfs.smudge=",
            "-c",
            "filter.lfs.clean=",
        ]
        .map(String::from),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FixedGitVersion;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> LoadOptions {
        LoadOptions::new()
            .with_app_path(dir.path().join("gitea"))
            .with_work_path(dir.path())
            .with_custom_path(dir.path().join("custom"))
            .with_home_dir(dir.path().join("home"))
            .with_temp_dir(dir.path().join("tmp"))
            .with_current_user("git")
    }

    #[test]
    fn test_pid_file_written() {
        let dir = TempDir::new().unwrap();
        let pid = dir.path().join("run/gitea.pid");
        create_pid_file(&pid).unwrap();
        assert_eq!(fs::read_to_string(&pid).unwrap(), process::id().to_string());
    }

    #[test]
    fn test_persist_keeps_existing_keys() {
        let dir = TempDir::new().unwrap();
        let conf = dir.path().join("app.ini");
        fs::write(&conf, "APP_NAME = Mine\n[server]\nDOMAIN = example.org\n").unwrap();
        let mut warnings = Vec::new();

        persist_generated_secret(&conf, "server", "LFS_JWT_SECRET", "abc", &mut warnings).unwrap();

        let saved = ConfigSource::from_file(&conf).unwrap();
        assert_eq!(saved.section("server").key("LFS_JWT_SECRET").string(), "abc");
        assert_eq!(saved.section("server").key("DOMAIN").string(), "example.org");
        assert_eq!(saved.section(DEFAULT_SECTION).key("APP_NAME").string(), "Mine");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_load_core_without_config_file() {
        let dir = TempDir::new().unwrap();
        let settings = load_core(&options(&dir), &FixedGitVersion("2.20.1".into())).unwrap();

        assert_eq!(settings.app_name, DEFAULT_APP_NAME);
        assert_eq!(settings.server.root_url, "http://localhost:3000/");
        assert!(settings
            .warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::MissingCustomConfig { .. })));
        assert_eq!(settings.git.global_command_args, vec!["-c", "credential.helper="]);
        assert_eq!(settings.git.version.as_deref(), Some("2.20.1"));
        // The generated internal token lands in the custom config.
        assert!(settings.paths.custom_conf.is_file());
    }

    #[test]
    fn test_old_git_skips_credential_helper() {
        let dir = TempDir::new().unwrap();
        let settings = load_core(&options(&dir), &FixedGitVersion("2.7.4".into())).unwrap();
        assert!(settings.git.global_command_args.is_empty());
    }

    #[test]
    fn test_check_lfs_version() {
        let dir = TempDir::new().unwrap();
        let conf = dir.path().join("custom/conf/app.ini");
        fs::create_dir_all(conf.parent().unwrap()).unwrap();
        fs::write(&conf, "[server]\nLFS_START_SERVER = true\n").unwrap();

        let mut settings = load_core(&options(&dir), &FixedGitVersion("2.0.0".into())).unwrap();
        check_lfs_version(&mut settings, &FixedGitVersion("2.0.0".into())).unwrap();
        assert!(!settings.lfs.start_server);
        assert!(settings
            .warnings
            .contains(&ConfigWarning::LfsGitTooOld { version: "2.0.0".into() }));

        let mut settings = load_core(&options(&dir), &FixedGitVersion("2.1.2".into())).unwrap();
        check_lfs_version(&mut settings, &FixedGitVersion("2.1.2".into())).unwrap();
        assert!(settings.lfs.start_server);
        assert_eq!(settings.git.global_command_args.len(), 6);
    }
}
