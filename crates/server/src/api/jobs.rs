//! Background job handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use codex_core::JobRecord;

use super::error::{job_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub message: String,
    pub job: JobRecord,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
}

fn accepted(job: JobRecord, message: &str) -> (StatusCode, Json<JobAcceptedResponse>) {
    (
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id: job.id.clone(),
            message: message.to_string(),
            job,
        }),
    )
}

/// POST /api/v1/scan
///
/// Starts a scan of every registered root and returns at once.
pub async fn start_scan(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), ApiError> {
    let job = state.jobs().spawn_scan().await.map_err(job_error)?;
    Ok(accepted(job, "Scan started in background"))
}

/// POST /api/v1/games/resolve-all
///
/// Starts resolving every PENDING and APPROVED entry and returns at once.
pub async fn start_bulk_resolve(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), ApiError> {
    let job = state.jobs().spawn_bulk_resolve().await.map_err(job_error)?;
    Ok(accepted(job, "Bulk resolution started in background"))
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobListResponse> {
    let jobs = state.jobs().list().await;
    let total = jobs.len();
    Json(JobListResponse { jobs, total })
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state.jobs().get(&id).await.map(Json).map_err(job_error)
}

/// POST /api/v1/jobs/{id}/cancel
///
/// Signals the job; it stops at the next root or entry boundary.
/// Cancelling a finished job is a no-op.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state.jobs().cancel(&id).await.map(Json).map_err(job_error)
}
