use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gitea-settings",
    version,
    about = "Load, validate and inspect the configuration of a self-hosted Git service",
    long_about = "Reads the custom app.ini, applies defaults, generates missing secrets and reports the resulting configuration snapshot. Exits with status 1 when the configuration cannot be loaded."
)]
pub struct Cli {
    /// Custom configuration file (relative paths live under the custom directory)
    #[arg(short, long, value_name = "FILE", env = "GITEA_CUSTOM_CONF")]
    pub config: Option<PathBuf>,

    /// Write the process id to this file
    #[arg(short = 'P', long, value_name = "FILE")]
    pub pid: Option<PathBuf>,

    /// Work directory, the base of every relative path
    #[arg(short, long, value_name = "DIR", env = "GITEA_WORK_DIR")]
    pub work_path: Option<PathBuf>,

    /// Custom directory (relative paths live under the work directory)
    #[arg(long, value_name = "DIR", env = "GITEA_CUSTOM")]
    pub custom_path: Option<PathBuf>,

    /// Git binary used for the version checks
    #[arg(long, value_name = "PATH", default_value = "git", env = "GITEA_GIT_PATH")]
    pub git_path: PathBuf,

    /// Log level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "GITEA_SETTINGS_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load the configuration and print a summary (default)
    Check,

    /// Print the loaded configuration as JSON, secrets redacted
    Dump,

    /// Generate values for app.ini
    Generate {
        #[command(subcommand)]
        what: GenerateCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GenerateCommands {
    /// Print a new random secret
    Secret {
        #[arg(value_enum)]
        kind: SecretKind,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    /// `[server] LFS_JWT_SECRET`
    LfsJwtSecret,
    /// `[security] INTERNAL_TOKEN`
    InternalToken,
    /// `[security] SECRET_KEY`
    SecretKey,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
