use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use navigator_db::DbPool;
use serde::Serialize;

use crate::state::{correlation_id, AppState, StorageMode};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub storage: StorageMode,
    pub llm_enabled: bool,
    pub catalog_items: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health)).route("/status", get(status))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db_pool {
        Some(pool) => database_check(pool).await,
        None => HealthCheck { status: "ready", detail: "serving the in-memory store".to_string() },
    };
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "navigator-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let catalog = state.catalog(&correlation_id()).await;
    Json(StatusResponse {
        status: "ok",
        service: "navigator-server",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        llm_enabled: state.engine.uses_llm(),
        catalog_items: catalog.len(),
    })
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
