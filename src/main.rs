//! Market scan CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use scan_config::load_config;
use scan_monitor::{setup_logging, LogFormat};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(cli.config.as_deref()).await;
    }

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Setup logging
    let log_level = match cli.log_level {
        Some(cli::LogLevel::Trace) => "trace",
        Some(cli::LogLevel::Debug) => "debug",
        Some(cli::LogLevel::Info) => "info",
        Some(cli::LogLevel::Warn) => "warn",
        Some(cli::LogLevel::Error) => "error",
        None => config.logging.level.as_str(),
    };
    let format = if cli.json_logs || config.logging.is_json() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    let _guard = setup_logging(log_level, format, config.logging.directory.as_deref().map(Path::new));

    // Execute command
    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &config).await,
        Commands::Health(args) => cli::commands::health::run(args, &config).await,
        Commands::ValidateConfig => Ok(()),
    }
}
