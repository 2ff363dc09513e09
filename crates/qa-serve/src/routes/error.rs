use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qa_core::error::{QaError, ReviewError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    /// Set for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &QaError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, field) = match err {
        QaError::Review(review) => map_review_error(review),
        QaError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, correlation_id = ?correlation_id, "request failed");
    }

    (
        status,
        Json(ErrorEnvelope {
            code,
            message: err.to_string(),
            field,
            correlation_id,
        }),
    )
}

pub fn error_response(err: &QaError, correlation_id: Option<String>) -> Response {
    map_error(err, correlation_id).into_response()
}

pub fn validation_response(
    field: &str,
    message: impl Into<String>,
    correlation_id: Option<String>,
) -> Response {
    error_response(
        &QaError::from(ReviewError::validation(field, message)),
        correlation_id,
    )
}

fn map_review_error(err: &ReviewError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        ReviewError::ReviewNotFound => (StatusCode::NOT_FOUND, "not_found", None),
        ReviewError::InvalidTransition { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_transition",
            None,
        ),
        ReviewError::Validation { field, .. } => (
            StatusCode::BAD_REQUEST,
            "validation_error",
            Some(field.clone()),
        ),
        ReviewError::Conflict { .. } => (StatusCode::CONFLICT, "conflict", None),
        ReviewError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            None,
        ),
    }
}
