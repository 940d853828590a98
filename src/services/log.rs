//! Log sinks from `[log] MODE` and the per-mode `[log.<mode>]` sections.
//!
//! Two passes read the same sections: one for the application logger and one
//! for the persistence (SQL) logger, which writes to its own file and may
//! leave out the console.

use crate::config::{ConfigWarning, LogLevel, Settings};
use crate::error::{ConfigError, Result};
use crate::utils::SecureString;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LOG_MODES: &[&str] = &["console", "file", "conn", "smtp", "database"];

const DEFAULT_MAX_SIZE_SHIFT: u32 = 28;

/// Mode-specific sink parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LogModeConfig {
    Console,
    File {
        filename: PathBuf,
        rotate: bool,
        max_size: u64,
        daily: bool,
        max_days: u32,
    },
    Conn {
        reconnect_on_msg: bool,
        reconnect: bool,
        net: String,
        addr: String,
    },
    Smtp {
        username: String,
        password: SecureString,
        host: String,
        send_tos: Vec<String>,
        subject: String,
    },
    Database {
        driver: String,
        conn: SecureString,
    },
}

/// One configured sink.
#[derive(Debug, Clone, Serialize)]
pub struct LogMode {
    pub level: LogLevel,
    #[serde(flatten)]
    pub config: LogModeConfig,
}

impl LogMode {
    pub fn name(&self) -> &'static str {
        match self.config {
            LogModeConfig::Console => "console",
            LogModeConfig::File { .. } => "file",
            LogModeConfig::Conn { .. } => "conn",
            LogModeConfig::Smtp { .. } => "smtp",
            LogModeConfig::Database { .. } => "database",
        }
    }

    /// The JSON configuration handed to the sink, including credentials.
    pub fn payload(&self) -> Value {
        let level = self.level.numeric();
        match &self.config {
            LogModeConfig::Console => json!({ "level": level }),
            LogModeConfig::File {
                filename,
                rotate,
                max_size,
                daily,
                max_days,
            } => json!({
                "level": level,
                "filename": filename,
                "rotate": rotate,
                "maxsize": max_size,
                "daily": daily,
                "maxdays": max_days,
            }),
            LogModeConfig::Conn {
                reconnect_on_msg,
                reconnect,
                net,
                addr,
            } => json!({
                "level": level,
                "reconnectOnMsg": reconnect_on_msg,
                "reconnect": reconnect,
                "net": net,
                "addr": addr,
            }),
            LogModeConfig::Smtp {
                username,
                password,
                host,
                send_tos,
                subject,
            } => json!({
                "level": level,
                "username": username,
                "password": password.expose_secret(),
                "host": host,
                "sendTos": send_tos,
                "subject": subject,
            }),
            LogModeConfig::Database { driver, conn } => json!({
                "level": level,
                "driver": driver,
                "conn": conn.expose_secret(),
            }),
        }
    }
}

/// The persistence logger's sinks and the level it runs at.
#[derive(Debug, Clone, Serialize)]
pub struct PersistenceLogSettings {
    pub modes: Vec<LogMode>,
    /// `Trace` is lowered to `Debug` and `Critical` to `Error`; `None` when every sink is off.
    pub level: Option<LogLevel>,
}

impl PersistenceLogSettings {
    /// No sink remains, so SQL logging is discarded.
    pub fn is_discarded(&self) -> bool {
        self.modes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogSettings {
    pub modes: Vec<LogMode>,
    pub buffer_len: i64,
    pub persistence: PersistenceLogSettings,
}

impl LogSettings {
    pub fn use_console(&self) -> bool {
        self.modes.iter().any(|m| matches!(m.config, LogModeConfig::Console))
    }
}

fn configured_modes(settings: &Settings) -> Vec<String> {
    settings
        .source()
        .section("log")
        .key("MODE")
        .must_string("console")
        .split(',')
        .map(|mode| mode.trim().to_string())
        .collect()
}

fn build_mode(
    settings: &Settings,
    mode: &str,
    default_file: &str,
    persistence: bool,
) -> Result<Option<LogMode>> {
    let section = format!("log.{mode}");
    let sec = settings.source().section(&section);

    let level = match sec.key("LEVEL").value().filter(|v| !v.trim().is_empty()) {
        Some(name) => LogLevel::from_name(name)?,
        None => settings.log.level,
    };

    let config = match mode {
        "console" => LogModeConfig::Console,
        "file" => {
            let mut filename = PathBuf::from(
                sec.key("FILE_NAME")
                    .must_string(&settings.log.root_path.join(default_file).to_string_lossy()),
            );
            let dir = filename.parent().map(Path::to_path_buf).unwrap_or_default();
            fs::create_dir_all(&dir).map_err(|e| ConfigError::io("create log directory", &dir, e))?;
            if persistence {
                filename = dir.join(default_file);
            }
            let shift = sec.key("MAX_SIZE_SHIFT").must_int(DEFAULT_MAX_SIZE_SHIFT);
            LogModeConfig::File {
                filename,
                rotate: sec.key("LOG_ROTATE").must_bool(true),
                max_size: 1u64.checked_shl(shift).unwrap_or(1 << DEFAULT_MAX_SIZE_SHIFT),
                daily: sec.key("DAILY_ROTATE").must_bool(true),
                max_days: sec.key("MAX_DAYS").must_int(7),
            }
        }
        "conn" => LogModeConfig::Conn {
            reconnect_on_msg: sec.key("RECONNECT_ON_MSG").must_bool(false),
            reconnect: sec.key("RECONNECT").must_bool(false),
            net: sec.key("PROTOCOL").in_values("tcp", &["tcp", "unix", "udp"]),
            addr: sec.key("ADDR").must_string(":7020"),
        },
        "smtp" => LogModeConfig::Smtp {
            username: sec.key("USER").must_string("example@example.com"),
            password: SecureString::new(sec.key("PASSWD").must_string("******")),
            host: sec.key("HOST").must_string("127.0.0.1:25"),
            send_tos: sec.key("RECEIVERS").must_strings(',', &["example@example.com"]),
            subject: sec.key("SUBJECT").must_string("Diagnostic message from serve"),
        },
        "database" => LogModeConfig::Database {
            driver: sec.key("DRIVER").string(),
            conn: SecureString::new(sec.key("CONN").string()),
        },
        _ => return Ok(None),
    };

    Ok(Some(LogMode { level, config }))
}

/// Application logger sinks. Unknown modes are skipped with a warning.
pub fn load_log(settings: &Settings, warnings: &mut Vec<ConfigWarning>) -> Result<LogSettings> {
    let mut modes = Vec::new();
    for mode in configured_modes(settings) {
        match build_mode(settings, &mode, "gitea.log", false)? {
            Some(sink) => {
                info!(log.mode = sink.name(), log.level = %sink.level, "Log mode configured");
                modes.push(sink);
            }
            None => ConfigWarning::UnknownLogMode { mode }.emit(warnings),
        }
    }

    Ok(LogSettings {
        modes,
        buffer_len: settings.source().section("log").key("BUFFER_LEN").must_int(10_000),
        persistence: load_persistence_log(settings, false)?,
    })
}

/// Persistence logger sinks; `disable_console` drops the console sink.
pub fn load_persistence_log(settings: &Settings, disable_console: bool) -> Result<PersistenceLogSettings> {
    let mut modes = Vec::new();
    for mode in configured_modes(settings) {
        if disable_console && mode == "console" {
            continue;
        }
        if let Some(sink) = build_mode(settings, &mode, "xorm.log", true)? {
            modes.push(sink);
        }
    }

    let level = modes.last().map(|sink| match sink.level {
        LogLevel::Trace | LogLevel::Debug => LogLevel::Debug,
        LogLevel::Info => LogLevel::Info,
        LogLevel::Warn => LogLevel::Warn,
        LogLevel::Error | LogLevel::Critical => LogLevel::Error,
    });

    Ok(PersistenceLogSettings { modes, level })
}
