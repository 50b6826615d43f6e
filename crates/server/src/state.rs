use std::sync::Arc;

use navigator_agent::RecommendationEngine;
use navigator_core::catalog::Catalog;
use navigator_db::repositories::{
    EquipmentRepository, InMemoryStore, JobEquipmentRepository, JobRepository, OrderRepository,
    SqlEquipmentRepository, SqlJobEquipmentRepository, SqlJobRepository, SqlOrderRepository,
};
use navigator_db::DbPool;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    Sqlite,
    Memory,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

#[derive(Clone)]
pub struct Repositories {
    pub equipment: Arc<dyn EquipmentRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub job_equipment: Arc<dyn JobEquipmentRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            equipment: Arc::new(SqlEquipmentRepository::new(pool.clone())),
            orders: Arc::new(SqlOrderRepository::new(pool.clone())),
            jobs: Arc::new(SqlJobRepository::new(pool.clone())),
            job_equipment: Arc::new(SqlJobEquipmentRepository::new(pool)),
        }
    }

    pub fn memory(store: InMemoryStore) -> Self {
        Self {
            equipment: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            jobs: Arc::new(store.clone()),
            job_equipment: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub engine: Arc<RecommendationEngine>,
    pub storage: StorageMode,
    pub db_pool: Option<DbPool>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        engine: RecommendationEngine,
        storage: StorageMode,
        db_pool: Option<DbPool>,
    ) -> Self {
        Self { repositories, engine: Arc::new(engine), storage, db_pool }
    }

    /// Catalog the assistant recommends from: the stored equipment table when
    /// it has rows, the built-in catalog otherwise.
    pub async fn catalog(&self, correlation_id: &str) -> Catalog {
        match self.repositories.equipment.list().await {
            Ok(items) if !items.is_empty() => Catalog::new(items),
            Ok(_) => Catalog::builtin(),
            Err(error) => {
                tracing::warn!(
                    event_name = "server.catalog.load_failed",
                    correlation_id,
                    error = %error,
                    "falling back to built-in catalog"
                );
                Catalog::builtin()
            }
        }
    }
}

pub fn correlation_id() -> String {
    format!("req-{}", uuid::Uuid::new_v4().simple())
}
