//! LinkVault binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Open the SQLite store
//! 3. Build the retention engine over the system clock
//! 4. Either run the recurring sweep (`serve`) or one admin operation

mod cli;
mod scheduler;

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use linkvault_core::clock::SystemClock;
use linkvault_core::config::LinkVaultConfig;
use linkvault_core::policy::RetentionPolicy;
use linkvault_storage::{Database, RetentionEngine};

use cli::{CliArgs, Command};
use scheduler::CleanupScheduler;

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the recurring sweep until Ctrl-C.
async fn serve(engine: Arc<RetentionEngine>, config: &LinkVaultConfig) -> std::io::Result<()> {
    if !config.scheduler.enabled {
        tracing::warn!("Scheduler disabled in config; nothing to run");
        return Ok(());
    }

    let scheduler = Arc::new(CleanupScheduler::from_config(engine, &config.scheduler));
    let handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.run().await }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    scheduler.shutdown();
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Scheduler task ended abnormally");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = LinkVaultConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG wins over the CLI/config level.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting LinkVault v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    let db_path = data_dir.join("linkvault.db");
    let db = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open database");
            return Err(e.into());
        }
    };
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let engine = Arc::new(RetentionEngine::with_database(
        db,
        Arc::new(SystemClock),
        RetentionPolicy::from_config(&config.retention),
    ));

    match args.command() {
        Command::Serve => serve(engine, &config).await?,
        Command::Sweep => print_json(&engine.cleanup_expired_urls().await?)?,
        Command::Stats => print_json(&engine.get_cleanup_stats().await?)?,
        Command::DeactivateExpired => {
            let deactivated = engine.deactivate_expired_urls().await?;
            print_json(&serde_json::json!({ "deactivatedCount": deactivated }))?
        }
        Command::CleanupUsers => {
            let deactivated = engine.cleanup_inactive_users().await?;
            print_json(&serde_json::json!({ "deactivatedCount": deactivated }))?
        }
    }

    Ok(())
}
