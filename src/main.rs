use std::{path::Path, sync::Arc};

use anyhow::Context;
use khatma_tracker::{
    KhatmaResult,
    api::{self, TrackerRegistry},
    clock::SystemClock,
    config::{Config, StorageKind},
    storage::{MemoryBackend, SqlBackend, StorageBackend},
};
use migration::MigratorTrait;
use poem::{Server, listener::TcpListener};
use sea_orm::Database;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

#[tokio::main]
async fn main() -> KhatmaResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!("{}=info,poem=info,sqlx=warn", env!("CARGO_PKG_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting Khatma Tracker"
    );
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let backend: Arc<dyn StorageBackend> = match config.storage {
        StorageKind::Sqlite => {
            let db_conn = Database::connect(&config.db_connection_string)
                .await
                .with_context(|| "Failed to connect to database")?;
            migration::Migrator::up(&db_conn, None)
                .await
                .with_context(|| "Failed to run database migrations")?;
            Arc::new(SqlBackend::new(Arc::new(db_conn)))
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage, progress will not survive a restart");
            Arc::new(MemoryBackend::new())
        }
    };
    tracing::info!(storage = ?config.storage, trial_days = config.trial_days, "configured storage");

    let registry = Arc::new(TrackerRegistry::new(
        backend,
        Arc::new(SystemClock),
        config.tracker_settings(),
    ));
    run_poem(registry, &config).await
}

pub async fn run_poem(registry: Arc<TrackerRegistry>, config: &Config) -> KhatmaResult<()> {
    let route = api::app(registry, config.public_url.clone());
    let bind_addr = config.bind_addr.clone();
    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
