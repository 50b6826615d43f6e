//! Chat assistant endpoint.
//!
//! - `POST /ai/recommendations`
//! - `POST /api/ai/recommendations`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use navigator_agent::response::PROCESSING_FAILURE_MESSAGE;
use navigator_agent::{RecommendationRequest, RecommendationResponse};
use serde::Serialize;
use tracing::{error, info};

use crate::state::{correlation_id, AppState};

#[derive(Debug, Serialize)]
pub struct RecommendationFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

type Failure = (StatusCode, Json<RecommendationFailure>);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/recommendations", post(recommend))
        .route("/api/ai/recommendations", post(recommend))
}

fn no_prompt() -> Failure {
    (
        StatusCode::BAD_REQUEST,
        Json(RecommendationFailure { error: "No prompt provided".to_string(), message: None }),
    )
}

pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, Failure> {
    let correlation_id = correlation_id();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            info!(
                event_name = "server.recommendation.rejected",
                correlation_id = %correlation_id,
                reason = %rejection.body_text(),
                "recommendation body could not be read"
            );
            return Err((
                StatusCode::BAD_REQUEST,
                Json(RecommendationFailure {
                    error: "Invalid request body".to_string(),
                    message: Some(rejection.body_text()),
                }),
            ));
        }
    };

    let Some(prompt) = request.prompt().map(str::to_string) else {
        return Err(no_prompt());
    };

    info!(
        event_name = "server.recommendation.received",
        correlation_id = %correlation_id,
        job_id = ?request.job_id,
        order_id = ?request.order_id,
        history = request.conversation_history.len(),
        "recommendation requested"
    );

    let catalog = state.catalog(&correlation_id).await;
    let engine = state.engine.clone();
    let history = request.conversation_history;
    let task_correlation_id = correlation_id.clone();
    let outcome = tokio::spawn(async move {
        engine.recommend(&prompt, &history, &catalog, &task_correlation_id).await
    })
    .await;

    match outcome {
        Ok(response) => Ok(Json(response)),
        Err(join_error) => {
            error!(
                event_name = "server.recommendation.failed",
                correlation_id = %correlation_id,
                error = %join_error,
                "recommendation task failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecommendationFailure {
                    error: "Failed to generate recommendations".to_string(),
                    message: Some(PROCESSING_FAILURE_MESSAGE.to_string()),
                }),
            ))
        }
    }
}
