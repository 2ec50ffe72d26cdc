//! Scan root and ignored path registration.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use codex_core::{IgnoredPath, ScanRoot};

use super::error::{bad_request, catalog_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterPathRequest {
    pub path: String,
}

impl RegisterPathRequest {
    fn validated(&self) -> Result<&str, ApiError> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(bad_request("path must not be blank"));
        }
        Ok(path)
    }
}

#[derive(Debug, Serialize)]
pub struct ScanRootListResponse {
    pub scan_roots: Vec<ScanRoot>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct IgnoredPathListResponse {
    pub ignored_paths: Vec<IgnoredPath>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/scan-roots
pub async fn list_scan_roots(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScanRootListResponse>, ApiError> {
    let scan_roots = state.store().list_scan_roots().map_err(catalog_error)?;
    let total = scan_roots.len();
    Ok(Json(ScanRootListResponse { scan_roots, total }))
}

/// POST /api/v1/scan-roots
///
/// Registering an already known path returns the existing root.
pub async fn add_scan_root(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterPathRequest>,
) -> Result<(StatusCode, Json<ScanRoot>), ApiError> {
    let path = request.validated()?;
    let root = state.store().add_scan_root(path).map_err(catalog_error)?;
    Ok((StatusCode::CREATED, Json(root)))
}

/// GET /api/v1/ignored-paths
pub async fn list_ignored_paths(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IgnoredPathListResponse>, ApiError> {
    let ignored_paths = state.store().list_ignored_paths().map_err(catalog_error)?;
    let total = ignored_paths.len();
    Ok(Json(IgnoredPathListResponse {
        ignored_paths,
        total,
    }))
}

/// POST /api/v1/ignored-paths
///
/// Only future scans are affected; an existing entry at the path stays.
pub async fn add_ignored_path(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterPathRequest>,
) -> Result<(StatusCode, Json<IgnoredPath>), ApiError> {
    let path = request.validated()?;
    let ignored = state.store().add_ignored_path(path).map_err(catalog_error)?;
    Ok((StatusCode::CREATED, Json(ignored)))
}
