//! applecal CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use applecal_client::cli::{Cli, Command, ConfigAction};
use applecal_client::commands;
use applecal_client::config::ClientConfig;
use applecal_client::error::ClientResult;
use applecal_core::{TracingConfig, init_tracing};
use applecal_providers::AppleCalendarProvider;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ClientConfig::default_path);
    let mut config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    cli.apply_to(&mut config);

    let pretty = config.output.pretty;
    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Command::Principal => {
            let provider = AppleCalendarProvider::connect(config.to_provider_config()?)?;
            commands::principal::run(&provider).await
        }
        Command::Calendars => {
            let provider = AppleCalendarProvider::connect(config.to_provider_config()?)?;
            commands::calendars::run(&provider, pretty).await
        }
        Command::Events(ref args) => {
            let provider = AppleCalendarProvider::connect(config.to_provider_config()?)?;
            commands::events::run(&provider, args, config.output.format, pretty).await
        }
    }
}
