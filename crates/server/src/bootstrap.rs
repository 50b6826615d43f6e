use navigator_agent::RecommendationEngine;
use navigator_core::config::AppConfig;
use navigator_db::{connection::connect_with_config, migrations, DbPool, DemoDataset};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::{AppState, Repositories, StorageMode};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("recommendation engine could not start: {0}")]
    Agent(#[source] anyhow::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );

    let (repositories, storage, db_pool) = match open_database(&config).await {
        Ok(pool) => (Repositories::sql(pool.clone()), StorageMode::Sqlite, Some(pool)),
        Err(BootstrapError::DatabaseConnect(error)) if config.database.fallback_to_memory => {
            warn!(
                event_name = "system.bootstrap.memory_fallback",
                correlation_id = "bootstrap",
                database_url = %config.database.url,
                error = %error,
                "database unavailable, serving the in-memory demo dataset"
            );
            (Repositories::memory(DemoDataset::memory_store()), StorageMode::Memory, None)
        }
        Err(error) => return Err(error),
    };

    let engine = RecommendationEngine::from_config(&config.llm).map_err(BootstrapError::Agent)?;
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        storage = storage.as_str(),
        llm_enabled = engine.uses_llm(),
        "application bootstrap complete"
    );

    let state = AppState::new(repositories, engine, storage, db_pool);
    Ok(Application { config, state })
}

async fn open_database(config: &AppConfig) -> Result<DbPool, BootstrapError> {
    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );
    Ok(db_pool)
}
