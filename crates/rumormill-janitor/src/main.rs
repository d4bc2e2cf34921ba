//! Rumormill Janitor - periodic rumor decay

use anyhow::{Context, Result};
use clap::Parser;
use rumormill_janitor::{AppConfig, ConfiguredGenerator, DecayWorker};
use rumormill_service::{RumorService, TracingDispatcher};
use rumormill_store::SqliteStore;
use rumormill_transformer::ContentTransformer;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rumormill Janitor - decays and expires rumors on a schedule.
#[derive(Debug, Parser)]
#[command(name = "rumormill-janitor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RUMORMILL_CONFIG")]
    config: Option<PathBuf>,

    /// Database path, overriding the [database] section
    #[arg(long, env = "RUMORMILL_DB")]
    database: Option<String>,

    /// Report what a sweep would change without saving
    #[arg(long)]
    dry_run: bool,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            warn!("No config file specified, using defaults");
            AppConfig::default()
        }
    };
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if cli.dry_run {
        config.janitor.dry_run = true;
    }
    config.validate()?;

    let store = SqliteStore::new(&config.database.path)
        .with_context(|| format!("Failed to open rumor database {}", config.database.path))?;
    let generator = ConfiguredGenerator::from_config(&config.llm);
    info!(
        "Opened {} with {} text generator",
        config.database.path,
        generator.provider_name()
    );

    let service = RumorService::new(
        store,
        ContentTransformer::new(generator, config.transformer.clone()),
        TracingDispatcher,
        config.service.clone(),
    )?;

    let mut worker = DecayWorker::new(config.janitor.clone());
    if cli.once {
        worker.run_cycles(&service, 1).await?;
    } else {
        worker.run(&service).await?;
    }
    Ok(())
}
