//! Job and job equipment endpoints.
//!
//! - `GET|PUT|DELETE /api/jobs/{id}`
//! - `GET  /api/jobs/{id}/equipment`                  lines of a job
//! - `PUT  /api/jobs/{id}/equipment`                  replace every line
//! - `POST /api/jobs/{id}/equipment`                  add a catalog item
//! - `DELETE /api/jobs/{id}/equipment/{equipment_id}` remove a line
//! - `GET  /api/equipment`                            the rental catalog

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
use navigator_core::domain::job::{Job, JobDraft, JobEquipmentLine, JobId};
use navigator_db::repositories::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::{correlation_id, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/jobs/{id}", get(get_job).put(update_job).delete(delete_job))
        .route("/api/jobs/{id}/equipment", get(list_lines).put(replace_lines).post(add_line))
        .route("/api/jobs/{id}/equipment/{equipment_id}", delete(remove_line))
        .route("/api/equipment", get(list_equipment))
}

#[derive(Debug, Serialize)]
pub struct JobEquipmentResponse {
    pub job: Job,
    pub lines: Vec<JobEquipmentLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    #[serde(alias = "equipment_id")]
    pub equipment_id: EquipmentId,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default = "one")]
    pub days: u32,
    #[serde(default)]
    pub notes: String,
}

fn one() -> u32 {
    1
}

async fn require_job(state: &AppState, id: JobId, correlation_id: &str) -> Result<Job, ApiError> {
    state
        .repositories
        .jobs
        .find_by_id(id)
        .await
        .map_err(|error| ApiError::from_repository(error, correlation_id))?
        .ok_or_else(|| {
            ApiError::from_repository(RepositoryError::NotFound { entity: "job", id: id.0 }, correlation_id)
        })
}

async fn with_lines(
    state: &AppState,
    job: Job,
    correlation_id: &str,
) -> Result<Json<JobEquipmentResponse>, ApiError> {
    let lines = state
        .repositories
        .job_equipment
        .list_for_job(job.id)
        .await
        .map_err(|error| ApiError::from_repository(error, correlation_id))?;
    Ok(Json(JobEquipmentResponse { job, lines }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Job>, ApiError> {
    let correlation_id = correlation_id();
    Ok(Json(require_job(&state, JobId(id), &correlation_id).await?))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<JobDraft>,
) -> Result<Json<Job>, ApiError> {
    let correlation_id = correlation_id();
    let mut job = require_job(&state, JobId(id), &correlation_id).await?;
    draft.apply_to(&mut job);

    let job = state
        .repositories
        .jobs
        .update(job)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    info!(event_name = "server.job.updated", correlation_id = %correlation_id, job_id = id, "job updated");
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = correlation_id();
    state
        .repositories
        .jobs
        .delete(JobId(id))
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    info!(event_name = "server.job.deleted", correlation_id = %correlation_id, job_id = id, "job deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_lines(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobEquipmentResponse>, ApiError> {
    let correlation_id = correlation_id();
    let job = require_job(&state, JobId(id), &correlation_id).await?;
    with_lines(&state, job, &correlation_id).await
}

pub async fn replace_lines(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(lines): Json<Vec<JobEquipmentLine>>,
) -> Result<Json<JobEquipmentResponse>, ApiError> {
    let correlation_id = correlation_id();
    let count = lines.len();
    let job = state
        .repositories
        .job_equipment
        .replace_lines(JobId(id), lines)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;

    info!(
        event_name = "server.job_equipment.replaced",
        correlation_id = %correlation_id,
        job_id = id,
        lines = count,
        job_total = %job.job_total,
        "job equipment replaced"
    );
    with_lines(&state, job, &correlation_id).await
}

pub async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<JobEquipmentResponse>, ApiError> {
    let correlation_id = correlation_id();
    let item = state
        .repositories
        .equipment
        .find_by_id(request.equipment_id)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?
        .ok_or_else(|| {
            ApiError::from_repository(
                RepositoryError::NotFound { entity: "equipment", id: request.equipment_id.0 },
                &correlation_id,
            )
        })?;

    let line = JobEquipmentLine::from_catalog(&item, request.quantity, request.days, &request.notes);
    let job = state
        .repositories
        .job_equipment
        .add_line(JobId(id), line)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;

    info!(
        event_name = "server.job_equipment.added",
        correlation_id = %correlation_id,
        job_id = id,
        equipment_id = item.id.0,
        "equipment added to job"
    );
    with_lines(&state, job, &correlation_id).await
}

pub async fn remove_line(
    State(state): State<AppState>,
    Path((id, equipment_id)): Path<(i64, i64)>,
) -> Result<Json<JobEquipmentResponse>, ApiError> {
    let correlation_id = correlation_id();
    let job = state
        .repositories
        .job_equipment
        .remove_line(JobId(id), EquipmentId(equipment_id))
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    with_lines(&state, job, &correlation_id).await
}

pub async fn list_equipment(State(state): State<AppState>) -> Json<Vec<EquipmentItem>> {
    let correlation_id = correlation_id();
    Json(state.catalog(&correlation_id).await.items().to_vec())
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };
    use navigator_agent::RecommendationEngine;
    use navigator_core::domain::equipment::EquipmentId;
    use navigator_core::domain::job::JobEquipmentLine;
    use navigator_db::DemoDataset;
    use rust_decimal::Decimal;

    use super::{add_line, delete_job, list_equipment, list_lines, remove_line, replace_lines, AddLineRequest};
    use crate::orders::get_order;
    use crate::state::{AppState, Repositories, StorageMode};

    fn state() -> State<AppState> {
        State(AppState::new(
            Repositories::memory(DemoDataset::memory_store()),
            RecommendationEngine::new(None).expect("engine"),
            StorageMode::Memory,
            None,
        ))
    }

    fn add(equipment_id: i64, quantity: u32, days: u32) -> Json<AddLineRequest> {
        Json(AddLineRequest {
            equipment_id: EquipmentId(equipment_id),
            quantity,
            days,
            notes: String::new(),
        })
    }

    #[tokio::test]
    async fn adding_equipment_updates_job_and_order_totals() {
        let state = state();

        // Projector - Standard at 200 for two days.
        let Json(first) = add_line(state.clone(), Path(28495), add(1, 1, 2)).await.expect("add");
        assert_eq!(first.job.job_total, Decimal::new(400, 0));
        assert_eq!(first.lines.len(), 1);

        // Wireless microphones at 75, merged into one line on the second add.
        add_line(state.clone(), Path(28495), add(3, 1, 1)).await.expect("add");
        let Json(merged) = add_line(state.clone(), Path(28495), add(3, 1, 1)).await.expect("add");
        assert_eq!(merged.lines.len(), 2);
        assert_eq!(merged.job.job_total, Decimal::new(550, 0));

        let Json(order) = get_order(state.clone(), Path(6118)).await.expect("order");
        assert_eq!(order.total, Decimal::new(550, 0));

        let Json(removed) =
            remove_line(state.clone(), Path((28495, 1))).await.expect("remove");
        assert_eq!(removed.job.job_total, Decimal::new(150, 0));
    }

    #[tokio::test]
    async fn invalid_lines_and_unknown_equipment_are_rejected() {
        let state = state();

        let unknown = add_line(state.clone(), Path(28495), add(999, 1, 1)).await.expect_err("unknown");
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let zero_days = add_line(state.clone(), Path(28495), add(1, 1, 0)).await.expect_err("days");
        assert_eq!(zero_days.status(), StatusCode::BAD_REQUEST);

        let Json(listing) = list_lines(state.clone(), Path(28495)).await.expect("lines");
        let mut lines = listing.lines;
        lines.push(JobEquipmentLine {
            equipment_id: EquipmentId(5),
            name: "Speaker".into(),
            category: "Audio".into(),
            rate: Decimal::new(180, 0),
            quantity: 0,
            days: 1,
            notes: String::new(),
        });
        let zero_quantity =
            replace_lines(state, Path(28495), Json(lines)).await.expect_err("quantity");
        assert_eq!(zero_quantity.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_client_rates_are_a_bad_request() {
        let state = state();
        let huge = JobEquipmentLine {
            equipment_id: EquipmentId(1),
            name: "Projector - Standard".into(),
            category: "Video".into(),
            rate: Decimal::from_i128_with_scale(10_i128.pow(22), 0),
            quantity: 4_000_000_000,
            days: 4_000_000_000,
            notes: String::new(),
        };

        let rejected =
            replace_lines(state.clone(), Path(28495), Json(vec![huge])).await.expect_err("overflow");
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let Json(listing) = list_lines(state, Path(28495)).await.expect("lines");
        assert!(listing.lines.is_empty());
        assert_eq!(listing.job.job_total, Decimal::new(2400, 0));
    }

    #[tokio::test]
    async fn deleting_a_job_and_listing_the_catalog() {
        let state = state();
        assert_eq!(delete_job(state.clone(), Path(27482)).await.expect("delete"), StatusCode::NO_CONTENT);

        let Json(order) = get_order(state.clone(), Path(6115)).await.expect("order");
        assert_eq!(order.total, Decimal::ZERO);

        let Json(catalog) = list_equipment(state).await;
        assert_eq!(catalog.len(), DemoDataset::equipment().len());
    }
}
