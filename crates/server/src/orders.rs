//! Order endpoints.
//!
//! - `GET    /api/orders`            search (`id`, `name`, `client_name`, `status`, `start_date`, `end_date`)
//! - `POST   /api/orders`            create
//! - `GET    /api/orders/{id}`       fetch
//! - `PUT    /api/orders/{id}`       update editable fields
//! - `DELETE /api/orders/{id}`       delete with its jobs
//! - `GET    /api/orders/{id}/jobs`  jobs of an order
//! - `POST   /api/orders/{id}/jobs`  add a job

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use navigator_core::domain::job::{Job, JobDraft};
use navigator_core::domain::order::{Order, OrderDraft, OrderFilter, OrderId};
use tracing::info;

use crate::error::ApiError;
use crate::state::{correlation_id, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(search_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order).put(update_order).delete(delete_order))
        .route("/api/orders/{id}/jobs", get(list_jobs).post(create_job))
}

pub async fn search_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let correlation_id = correlation_id();
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(ApiError::bad_request("start_date must not be after end_date", &correlation_id));
        }
    }
    let orders = state
        .repositories
        .orders
        .search(&filter)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let correlation_id = correlation_id();
    let order = state
        .repositories
        .orders
        .create(draft)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;

    info!(
        event_name = "server.order.created",
        correlation_id = %correlation_id,
        order_id = order.id.0,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

async fn require_order(state: &AppState, id: OrderId, correlation_id: &str) -> Result<Order, ApiError> {
    state
        .repositories
        .orders
        .find_by_id(id)
        .await
        .map_err(|error| ApiError::from_repository(error, correlation_id))?
        .ok_or_else(|| ApiError::from_repository(not_found(id), correlation_id))
}

fn not_found(id: OrderId) -> navigator_db::repositories::RepositoryError {
    navigator_db::repositories::RepositoryError::NotFound { entity: "order", id: id.0 }
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let correlation_id = correlation_id();
    Ok(Json(require_order(&state, OrderId(id), &correlation_id).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<Order>, ApiError> {
    let correlation_id = correlation_id();
    let mut order = require_order(&state, OrderId(id), &correlation_id).await?;
    draft.apply_to(&mut order);

    let order = state
        .repositories
        .orders
        .update(order)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    info!(
        event_name = "server.order.updated",
        correlation_id = %correlation_id,
        order_id = id,
        status = order.status.as_str(),
        "order updated"
    );
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = correlation_id();
    state
        .repositories
        .orders
        .delete(OrderId(id))
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;

    info!(
        event_name = "server.order.deleted",
        correlation_id = %correlation_id,
        order_id = id,
        "order deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let correlation_id = correlation_id();
    let order = require_order(&state, OrderId(id), &correlation_id).await?;
    let jobs = state
        .repositories
        .jobs
        .list_for_order(order.id)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;
    Ok(Json(jobs))
}

pub async fn create_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let correlation_id = correlation_id();
    let job = state
        .repositories
        .jobs
        .create(OrderId(id), draft)
        .await
        .map_err(|error| ApiError::from_repository(error, &correlation_id))?;

    info!(
        event_name = "server.job.created",
        correlation_id = %correlation_id,
        order_id = id,
        job_id = job.id.0,
        "job created"
    );
    Ok((StatusCode::CREATED, Json(job)))
}
