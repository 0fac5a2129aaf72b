//! rTimeclock library root.
//! Exposes the CLI parser, the high-level run() function, and the tracking
//! engine (sessions, breaks, grace period) with its SQLite store.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod jobs;
pub mod models;
pub mod ui;
pub mod utils;

use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::In { .. } => cli::commands::clock_in::handle(&cli.command, cfg).await,
        Commands::Out { .. } => cli::commands::clock_out::handle(&cli.command, cfg).await,
        Commands::Break { .. } => cli::commands::breaks::handle(&cli.command, cfg).await,
        Commands::Status => cli::commands::status::handle(cfg).await,
        Commands::List { .. } => cli::commands::list::handle(&cli.command, cfg),
        Commands::Watch { .. } => cli::commands::watch::handle(&cli.command, cfg).await,
        Commands::Export { .. } => cli::commands::export::handle(&cli.command, cfg),
        Commands::Job { .. } => cli::commands::job::handle(&cli.command, cfg).await,
    }
}

/// Load the config once and apply the global command-line overrides.
pub fn resolve_config(cli: &Cli) -> AppResult<Config> {
    let mut cfg = if cli.test {
        Config::default()
    } else {
        Config::load()?
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(org) = &cli.org {
        cfg.organization_id = org.clone();
    }
    if let Some(employee) = &cli.employee {
        cfg.employee_id = employee.clone();
    }

    Ok(cfg)
}

/// Entry point used by main.rs
pub async fn run(cli: Cli, cfg: Config) -> AppResult<()> {
    dispatch(&cli, &cfg).await
}
