//! JSON error bodies and status mapping for API handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use codex_core::{CatalogError, JobError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Map a store error onto the response a caller should see.
pub fn catalog_error(e: CatalogError) -> ApiError {
    let status = match &e {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CatalogError::Database(_) | CatalogError::Internal(_) => {
            error!("Catalog error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

pub fn job_error(e: JobError) -> ApiError {
    match e {
        JobError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        JobError::Catalog(e) => catalog_error(e),
    }
}
