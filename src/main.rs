// src/main.rs

use anyhow::Context;
use gitea_settings::cli::{Cli, Commands, GenerateCommands, SecretKind};
use gitea_settings::config::global;
use gitea_settings::utils::crypto::{new_internal_token, new_lfs_jwt_secret, new_secret_key};
use gitea_settings::{load, ConfigError, LoadOptions, SystemGit};
use serde_json::json;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(cli: &Cli) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn load_options(cli: &Cli) -> LoadOptions {
    LoadOptions {
        work_path: cli.work_path.clone(),
        custom_path: cli.custom_path.clone(),
        custom_conf: cli.config.clone(),
        custom_pid: cli.pid.clone(),
        ..LoadOptions::default()
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let command = cli.command.clone().unwrap_or(Commands::Check);

    if let Commands::Generate {
        what: GenerateCommands::Secret { kind },
    } = command
    {
        let secret = match kind {
            SecretKind::LfsJwtSecret => new_lfs_jwt_secret(),
            SecretKind::InternalToken => new_internal_token(),
            SecretKind::SecretKey => new_secret_key(),
        };
        println!("{secret}");
        return Ok(());
    }

    let git = SystemGit::new(&cli.git_path);
    let (settings, services) = load(&load_options(cli), &git)?;
    let settings = global::init(settings)?;

    match command {
        Commands::Dump => {
            let snapshot = json!({ "settings": settings, "services": services });
            let rendered = serde_json::to_string_pretty(&snapshot).context("failed to render configuration")?;
            println!("{rendered}");
        }
        _ => {
            let warnings = settings.warnings.len() + services.warnings.len();
            info!(
                config.path = %settings.paths.custom_conf.display(),
                server.root_url = %settings.server.root_url,
                lfs.enabled = settings.lfs.start_server,
                mailer.enabled = services.mailer.is_some(),
                warnings,
                "Configuration is valid"
            );
            println!("{}: {}", settings.app_name, settings.server.root_url);
            println!("config:   {}", settings.paths.custom_conf.display());
            println!("landing:  {}", settings.server.landing_page.url());
            println!("warnings: {warnings}");
            for warning in settings.warnings.iter().chain(&services.warnings) {
                println!("  - {warning}");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ConfigError>() {
                Some(config_error) => config_error.log(),
                None => error!(error = ?e, "Command failed"),
            }
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
