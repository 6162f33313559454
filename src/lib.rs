//! rTaskSync library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod source;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Connect { .. } => cli::commands::connect::handle(&cli.command, cfg).await,
        Commands::Tables => cli::commands::tables::handle(cfg).await,
        Commands::Map { .. } => cli::commands::map::handle(&cli.command, cfg).await,
        Commands::Rows { .. } => cli::commands::rows::handle(&cli.command, cfg).await,
        Commands::Facets { .. } => cli::commands::facets::handle(&cli.command, cfg).await,
        Commands::Edit { .. } => cli::commands::edit::handle(&cli.command, cfg).await,
        Commands::Watch { .. } => cli::commands::watch::handle(&cli.command, cfg).await,
        Commands::Period { .. } => cli::commands::period::handle(&cli.command, cfg).await,
        Commands::Task { .. } => cli::commands::task::handle(&cli.command, cfg).await,
        Commands::Timer { .. } => cli::commands::timer::handle(&cli.command, cfg).await,
        Commands::Disconnect => cli::commands::disconnect::handle(cfg),
    }
}

/// Entry point used by main.rs
pub async fn run() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = config::expand_tilde(custom_db).to_string_lossy().to_string();
    }

    dispatch(&cli, &cfg).await
}
