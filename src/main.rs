//! karma-sync CLI entry point.

use anyhow::Context;
use clap::Parser;

use karma_sync::cli::{handle_error, Cli, Commands};
use karma_sync::infrastructure::config::ConfigLoader;
use karma_sync::infrastructure::logging::{LogConfig, LoggerImpl};
use karma_sync::infrastructure::setup::SetupPaths;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load().context("Failed to load configuration") {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Ok(paths) = SetupPaths::new() {
        if paths.logs_dir.is_dir() {
            log_config = log_config.with_log_dir(paths.logs_dir);
        }
    }
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => karma_sync::cli::commands::init::execute(args, cli.json).await,
        Commands::Player(args) => karma_sync::cli::commands::player::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
