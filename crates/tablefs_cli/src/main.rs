//! tablefs - command-line front end for the SQLite table filesystem

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::AppConfig;
use std::io::Write;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let flags override it
    let config_source = AppConfig::source(cli.config.as_deref());
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    // Logging depends on the configuration, so it starts second
    let _log_guard = tablefs_log::init_logging(&config.log_options())?;
    tablefs_log::init_panic_hook();

    match &config_source {
        Some(path) => tracing::info!("Configuration loaded from {:?}", path),
        None => tracing::debug!("Using default configuration"),
    }

    if let Some(dir) = config.log_options().file_dir {
        if let Err(e) = tablefs_log::cleanup_old_logs(&dir, config.logging.retain_days) {
            tracing::warn!("Failed to cleanup old logs: {}", e);
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Commands::Config { save } = &cli.command {
        out.write_all(config.to_toml()?.as_bytes())?;
        if *save {
            let path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
            config.save(&path)?;
        }
        return Ok(());
    }

    let database = config.database_path();
    let fs = tablefs_db::open(&database, config.database.pool_size, config.adapter_options())
        .with_context(|| format!("Failed to open database {:?}", database))?;

    commands::execute(&fs, &cli.command, &mut out)?;
    out.flush()?;
    Ok(())
}
