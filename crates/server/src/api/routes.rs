use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{games, handlers, jobs, middleware::metrics_middleware, paths};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Scan roots and ignore list
        .route(
            "/scan-roots",
            get(paths::list_scan_roots).post(paths::add_scan_root),
        )
        .route(
            "/ignored-paths",
            get(paths::list_ignored_paths).post(paths::add_ignored_path),
        )
        // Games
        .route("/games", get(games::list_games))
        .route("/games/import", post(games::import_games))
        .route("/games/resolve-all", post(jobs::start_bulk_resolve))
        .route(
            "/games/{id}",
            get(games::get_game)
                .put(games::update_game)
                .delete(games::delete_game),
        )
        .route("/games/{id}/resolve", post(games::resolve_game))
        // Jobs
        .route("/scan", post(jobs::start_scan))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/cancel", post(jobs::cancel_job));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
