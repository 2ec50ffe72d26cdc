//! Catalog entry handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use codex_core::{
    metrics::GAMES_CREATED, Game, GameFilter, GameStatus, GameUpdate, ImportSummary,
    ResolveOutcome,
};

use super::error::{bad_request, catalog_error, ApiError, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GameQueryParams {
    /// Comma-separated statuses, e.g. `PENDING,APPROVED`.
    #[serde(default)]
    pub status: Option<String>,
}

impl GameQueryParams {
    fn filter(&self) -> Result<GameFilter, ApiError> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(GameFilter::new());
        };

        let statuses = raw
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<GameStatus>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bad_request(e.to_string()))?;

        Ok(GameFilter::new().with_statuses(&statuses))
    }
}

#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<Game>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub summary: ImportSummary,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub game: Game,
}

impl From<ResolveOutcome> for ResolveResponse {
    fn from(outcome: ResolveOutcome) -> Self {
        match outcome {
            ResolveOutcome::Resolved(game) => Self {
                resolved: true,
                message: None,
                game,
            },
            ResolveOutcome::NoMatch(game) => Self {
                resolved: false,
                message: Some("No metadata found".to_string()),
                game,
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/games
///
/// List entries, optionally restricted to `?status=`.
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GameQueryParams>,
) -> Result<Json<GameListResponse>, ApiError> {
    let filter = params.filter()?;
    let games = state.store().list_games(&filter).map_err(catalog_error)?;
    let total = games.len();
    Ok(Json(GameListResponse { games, total }))
}

/// GET /api/v1/games/{id}
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    state
        .store()
        .get_game(&id)
        .map(Json)
        .map_err(catalog_error)
}

/// PUT /api/v1/games/{id}
///
/// Only fields present in the body change.
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<GameUpdate>,
) -> Result<Json<Game>, ApiError> {
    let game = state
        .store()
        .update_game(&id, &update)
        .map_err(catalog_error)?;
    info!("Updated game {} ({})", game.id, game.status);
    Ok(Json(game))
}

/// DELETE /api/v1/games/{id}
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.store().delete_game(&id).map_err(catalog_error)?;
    info!("Deleted game {}", id);
    Ok(Json(SuccessResponse {
        message: format!("Deleted game {}", id),
    }))
}

/// POST /api/v1/games/import
///
/// Create virtual entries from bare names. Blank names are dropped and
/// names already catalogued are skipped.
pub async fn import_games(
    State(state): State<Arc<AppState>>,
    Json(names): Json<Vec<String>>,
) -> Result<Json<ImportResponse>, ApiError> {
    let summary = state.store().import_titles(&names).map_err(catalog_error)?;

    GAMES_CREATED
        .with_label_values(&["import"])
        .inc_by(summary.imported as u64);
    info!(
        "Imported {} game(s), {} skipped",
        summary.imported, summary.skipped
    );

    Ok(Json(ImportResponse {
        message: format!("Imported {} games", summary.imported),
        summary,
    }))
}

/// POST /api/v1/games/{id}/resolve
///
/// Synchronous lookup for one entry. A provider miss or failure is
/// reported as `resolved: false` with the entry unchanged.
pub async fn resolve_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let outcome = state
        .bulk_resolver()
        .resolve_one(&id)
        .await
        .map_err(catalog_error)?;
    Ok(Json(ResolveResponse::from(outcome)))
}
