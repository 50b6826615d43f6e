use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use navigator_core::errors::{ApplicationError, InterfaceError};
use navigator_db::repositories::RepositoryError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

/// HTTP face of an [`InterfaceError`]. Client mistakes carry the detailed
/// message, server-side failures only the user-safe one.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        })
    }

    pub fn from_repository(error: RepositoryError, correlation_id: &str) -> Self {
        let mapped = ApplicationError::from(error).into_interface(correlation_id);
        match &mapped {
            InterfaceError::ServiceUnavailable { message, .. }
            | InterfaceError::Internal { message, .. } => {
                tracing::error!(
                    event_name = "server.repository.failed",
                    correlation_id,
                    error = %message,
                    "repository call failed"
                );
            }
            InterfaceError::BadRequest { .. } | InterfaceError::NotFound { .. } => {}
        }
        Self(mapped)
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self.0 {
            InterfaceError::BadRequest { message, .. } | InterfaceError::NotFound { message, .. } => {
                message.clone()
            }
            other => other.user_message().to_string(),
        };
        let body = ErrorBody { error, correlation_id: self.0.correlation_id().to_string() };
        (status, Json(body)).into_response()
    }
}
