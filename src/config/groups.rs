// src/config/groups.rs

//! Groups that map one section onto one struct with fixed defaults.

use crate::config::app::ConfigWarning;
use crate::config::source::ConfigSource;
use crate::config::validation::ConfigValidator;
use crate::error::{ConfigError, Result};
use crate::utils::SecureString;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Severity names accepted by `[log]` and `[log.<mode>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// Case-insensitive lookup of a level name.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownLogLevel {
                level: name.to_string(),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warn => "Warn",
            Self::Error => "Error",
            Self::Critical => "Critical",
        }
    }

    /// Position in the severity scale, `0` for `Trace`.
    pub fn numeric(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRootSettings {
    pub level: LogLevel,
    pub root_path: PathBuf,
}

impl LogRootSettings {
    pub fn from_source(source: &ConfigSource, work_path: &Path) -> Result<Self> {
        let sec = source.section("log");
        let level = LogLevel::from_name(&sec.key("LEVEL").must_string("Info"))?;
        let root_path = sec
            .key("ROOT_PATH")
            .must_string(&work_path.join("log").to_string_lossy());
        ConfigValidator::force_path_separator(&root_path)?;
        Ok(Self {
            level,
            root_path: PathBuf::from(root_path),
        })
    }
}

pub const DB_TYPES: &[&str] = &["mysql", "postgres", "mssql", "sqlite3", "tidb"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub db_type: String,
    pub use_mysql: bool,
    pub use_postgresql: bool,
    pub use_mssql: bool,
    pub use_sqlite3: bool,
    pub use_tidb: bool,
    pub iterate_buffer_size: usize,
    pub log_sql: bool,
    pub connect_retries: u32,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub connect_backoff: Duration,
}

impl DatabaseSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("database");
        let db_type = sec.key("DB_TYPE").in_values("mysql", DB_TYPES);
        Self {
            use_mysql: db_type == "mysql",
            use_postgresql: db_type == "postgres",
            use_mssql: db_type == "mssql",
            use_sqlite3: db_type == "sqlite3",
            use_tidb: db_type == "tidb",
            db_type,
            iterate_buffer_size: sec.key("ITERATE_BUFFER_SIZE").must_int(50),
            log_sql: sec.key("LOG_SQL").must_bool(true),
            connect_retries: sec.key("DB_RETRIES").must_int(10),
            connect_backoff: sec.key("DB_RETRY_BACKOFF").must_duration(Duration::from_secs(3)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiAdminSettings {
    pub user_paging_num: usize,
    pub repo_paging_num: usize,
    pub notice_paging_num: usize,
    pub org_paging_num: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiUserSettings {
    pub repo_paging_num: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiMetaSettings {
    pub author: String,
    pub description: String,
    pub keywords: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiSettings {
    pub explore_paging_num: usize,
    pub issue_paging_num: usize,
    pub repo_search_paging_num: usize,
    pub feed_max_commit_num: usize,
    pub graph_max_commit_num: usize,
    pub code_comment_lines: usize,
    pub reaction_max_user_num: usize,
    pub theme_color_meta_tag: String,
    pub max_display_file_size: u64,
    pub show_user_email: bool,
    pub default_theme: String,
    pub themes: Vec<String>,
    pub admin: UiAdminSettings,
    pub user: UiUserSettings,
    pub meta: UiMetaSettings,
}

impl UiSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("ui");
        let admin = source.section("ui.admin");
        let user = source.section("ui.user");
        let meta = source.section("ui.meta");
        Self {
            explore_paging_num: sec.key("EXPLORE_PAGING_NUM").must_int(20),
            issue_paging_num: sec.key("ISSUE_PAGING_NUM").must_int(10),
            repo_search_paging_num: sec.key("REPO_SEARCH_PAGING_NUM").must_int(10),
            feed_max_commit_num: sec.key("FEED_MAX_COMMIT_NUM").must_int(5),
            graph_max_commit_num: sec.key("GRAPH_MAX_COMMIT_NUM").must_int(100),
            code_comment_lines: sec.key("CODE_COMMENT_LINES").must_int(4),
            reaction_max_user_num: sec.key("REACTION_MAX_USER_NUM").must_int(10),
            theme_color_meta_tag: sec.key("THEME_COLOR_META_TAG").must_string("#6cc644"),
            max_display_file_size: sec.key("MAX_DISPLAY_FILE_SIZE").must_int(8_388_608),
            show_user_email: sec.key("SHOW_USER_EMAIL").must_bool(true),
            default_theme: sec.key("DEFAULT_THEME").must_string("gitea"),
            themes: sec.key("THEMES").must_strings(',', &["gitea", "arc-green"]),
            admin: UiAdminSettings {
                user_paging_num: admin.key("USER_PAGING_NUM").must_int(50),
                repo_paging_num: admin.key("REPO_PAGING_NUM").must_int(50),
                notice_paging_num: admin.key("NOTICE_PAGING_NUM").must_int(25),
                org_paging_num: admin.key("ORG_PAGING_NUM").must_int(50),
            },
            user: UiUserSettings {
                repo_paging_num: user.key("REPO_PAGING_NUM").must_int(15),
            },
            meta: UiMetaSettings {
                author: meta.key("AUTHOR").must_string("Gitea - Git with a cup of tea"),
                description: meta.key("DESCRIPTION").must_string(
                    "Gitea (Git with a cup of tea) is a painless self-hosted Git service written in Go",
                ),
                keywords: meta.key("KEYWORDS").must_string("go,git,self-hosted,gitea"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownSettings {
    pub enable_hard_line_break: bool,
    pub custom_url_schemes: Vec<String>,
    pub file_extensions: Vec<String>,
}

impl MarkdownSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("markdown");
        Self {
            enable_hard_line_break: sec.key("ENABLE_HARD_LINE_BREAK").must_bool(false),
            custom_url_schemes: sec.key("CUSTOM_URL_SCHEMES").strings(','),
            file_extensions: sec
                .key("FILE_EXTENSIONS")
                .must_strings(',', &[".md", ".markdown", ".mdown", ".mkd"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSettings {
    pub disable_regular_org_creation: bool,
}

impl AdminSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        Self {
            disable_regular_org_creation: source
                .section("admin")
                .key("DISABLE_REGULAR_ORG_CREATION")
                .must_bool(false),
        }
    }
}

const DAILY: &str = "@every 24h";

/// Scheduling shared by every housekeeping job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronJob {
    pub enabled: bool,
    pub run_at_start: bool,
    pub schedule: String,
}

impl CronJob {
    fn from_section(source: &ConfigSource, name: &str, run_at_start: bool, schedule: &str) -> Self {
        let sec = source.section(name);
        Self {
            enabled: sec.key("ENABLED").must_bool(true),
            run_at_start: sec.key("RUN_AT_START").must_bool(run_at_start),
            schedule: sec.key("SCHEDULE").must_string(schedule),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoHealthCheckJob {
    #[serde(flatten)]
    pub job: CronJob,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub timeout: Duration,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupJob {
    #[serde(flatten)]
    pub job: CronJob,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub older_than: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncExternalUsersJob {
    #[serde(flatten)]
    pub job: CronJob,
    pub update_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronSettings {
    pub update_mirrors: CronJob,
    pub repo_health_check: RepoHealthCheckJob,
    pub check_repo_stats: CronJob,
    pub archive_cleanup: CleanupJob,
    pub sync_external_users: SyncExternalUsersJob,
    pub deleted_branches_cleanup: CleanupJob,
}

impl CronSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let day = Duration::from_secs(24 * 3600);
        let cleanup = |name: &str| CleanupJob {
            job: CronJob::from_section(source, name, true, DAILY),
            older_than: source.section(name).key("OLDER_THAN").must_duration(day),
        };
        Self {
            update_mirrors: CronJob::from_section(source, "cron.update_mirrors", false, "@every 10m"),
            repo_health_check: RepoHealthCheckJob {
                job: CronJob::from_section(source, "cron.repo_health_check", false, DAILY),
                timeout: source
                    .section("cron.repo_health_check")
                    .key("TIMEOUT")
                    .must_duration(Duration::from_secs(60)),
                args: source.section("cron.repo_health_check").key("ARGS").strings(' '),
            },
            check_repo_stats: CronJob::from_section(source, "cron.check_repo_stats", true, DAILY),
            archive_cleanup: cleanup("cron.archive_cleanup"),
            sync_external_users: SyncExternalUsersJob {
                job: CronJob::from_section(source, "cron.sync_external_users", false, DAILY),
                update_existing: source
                    .section("cron.sync_external_users")
                    .key("UPDATE_EXISTING")
                    .must_bool(true),
            },
            deleted_branches_cleanup: cleanup("cron.deleted_branches_cleanup"),
        }
    }
}

/// Per-operation git timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitTimeouts {
    pub migrate: u64,
    pub mirror: u64,
    pub clone: u64,
    pub pull: u64,
    pub gc: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSettings {
    /// Version reported by the git binary at load time.
    pub version: Option<String>,
    pub disable_diff_highlight: bool,
    pub max_git_diff_lines: usize,
    pub max_git_diff_line_characters: usize,
    pub max_git_diff_files: usize,
    pub gc_args: Vec<String>,
    pub timeout: GitTimeouts,
    /// Arguments prepended to every git invocation.
    pub global_command_args: Vec<String>,
}

impl GitSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("git");
        let timeout = source.section("git.timeout");
        Self {
            version: None,
            disable_diff_highlight: sec.key("DISABLE_DIFF_HIGHLIGHT").must_bool(false),
            max_git_diff_lines: sec.key("MAX_GIT_DIFF_LINES").must_int(1000),
            max_git_diff_line_characters: sec.key("MAX_GIT_DIFF_LINE_CHARACTERS").must_int(5000),
            max_git_diff_files: sec.key("MAX_GIT_DIFF_FILES").must_int(100),
            gc_args: sec.key("GC_ARGS").strings(' '),
            timeout: GitTimeouts {
                migrate: timeout.key("MIGRATE").must_int(600),
                mirror: timeout.key("MIRROR").must_int(300),
                clone: timeout.key("CLONE").must_int(300),
                pull: timeout.key("PULL").must_int(300),
                gc: timeout.key("GC").must_int(60),
            },
            global_command_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorSettings {
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub min_interval: Duration,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub default_interval: Duration,
}

impl MirrorSettings {
    pub fn from_source(source: &ConfigSource, warnings: &mut Vec<ConfigWarning>) -> Self {
        let sec = source.section("mirror");
        let (min_interval, default_interval) = ConfigValidator::check_mirror_intervals(
            sec.key("MIN_INTERVAL").must_duration(Duration::from_secs(10 * 60)),
            sec.key("DEFAULT_INTERVAL").must_duration(Duration::from_secs(8 * 3600)),
            warnings,
        );
        Self {
            min_interval,
            default_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiSettings {
    pub enable_swagger: bool,
    pub max_response_items: usize,
}

impl ApiSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("api");
        Self {
            enable_swagger: sec.key("ENABLE_SWAGGER").must_bool(true),
            max_response_items: sec.key("MAX_RESPONSE_ITEMS").must_int(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct U2fSettings {
    pub app_id: String,
    pub trusted_facets: Vec<String>,
}

impl U2fSettings {
    /// Both values default to the root URL without its trailing slash.
    pub fn from_source(source: &ConfigSource, app_url: &str) -> Self {
        let sec = source.section("U2F");
        let facets = sec.key("TRUSTED_FACETS").must_string(app_url);
        Self {
            app_id: sec.key("APP_ID").must_string(app_url),
            trusted_facets: shell_words::split(&facets).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub token: SecureString,
}

impl MetricsSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("metrics");
        Self {
            enabled: sec.key("ENABLED").must_bool(false),
            token: SecureString::new(sec.key("TOKEN").string()),
        }
    }
}

pub const DEFAULT_LANGS: &[&str] = &[
    "en-US", "zh-CN", "zh-HK", "zh-TW", "de-DE", "fr-FR", "nl-NL", "lv-LV", "ru-RU", "uk-UA",
    "ja-JP", "es-ES", "pt-BR", "pl-PL", "bg-BG", "it-IT", "fi-FI", "tr-TR", "cs-CZ", "sr-SP",
    "sv-SE", "ko-KR",
];

pub const DEFAULT_LANG_NAMES: &[&str] = &[
    "English",
    "简体中文",
    "繁體中文（香港）",
    "繁體中文（台灣）",
    "Deutsch",
    "français",
    "Nederlands",
    "latviešu",
    "русский",
    "Українська",
    "日本語",
    "español",
    "português do Brasil",
    "polski",
    "български",
    "italiano",
    "suomi",
    "Türkçe",
    "čeština",
    "српски",
    "svenska",
    "한국어",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct I18nSettings {
    pub langs: Vec<String>,
    pub names: Vec<String>,
    /// Locale to datetime plugin locale, from `[i18n.datelang]`.
    pub date_langs: BTreeMap<String, String>,
}

impl I18nSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("i18n");
        Self {
            langs: sec.key("LANGS").must_strings(',', DEFAULT_LANGS),
            names: sec.key("NAMES").must_strings(',', DEFAULT_LANG_NAMES),
            date_langs: source.section("i18n.datelang").keys_hash(),
        }
    }

    pub fn date_lang(&self, lang: &str) -> &str {
        self.date_langs.get(lang).map(String::as_str).unwrap_or("en")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherSettings {
    pub show_footer_branding: bool,
    pub show_footer_version: bool,
    pub show_footer_template_load_time: bool,
}

impl OtherSettings {
    pub fn from_source(source: &ConfigSource) -> Self {
        let sec = source.section("other");
        Self {
            show_footer_branding: sec.key("SHOW_FOOTER_BRANDING").must_bool(false),
            show_footer_version: sec.key("SHOW_FOOTER_VERSION").must_bool(true),
            show_footer_template_load_time: sec.key("SHOW_FOOTER_TEMPLATE_LOAD_TIME").must_bool(true),
        }
    }
}
