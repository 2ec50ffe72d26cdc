//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scanning and ingestion
//! - Metadata resolution (per entry and per provider request)
//! - Background jobs

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Scan / Ingest Metrics
// =============================================================================

/// Candidates discovered by the scanner.
pub static SCANNED_CANDIDATES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "codex_scanned_candidates_total",
        "Total game candidates discovered under scan roots",
    )
    .unwrap()
});

/// Scan roots that could not be read.
pub static SCAN_ROOT_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "codex_scan_root_errors_total",
        "Total scan roots skipped because they could not be read",
    )
    .unwrap()
});

/// Catalog entries created, by origin.
pub static GAMES_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("codex_games_created_total", "Total catalog entries created"),
        &["origin"], // "scan", "import"
    )
    .unwrap()
});

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Resolution attempts by result.
pub static RESOLVE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "codex_resolve_attempts_total",
            "Total metadata resolution attempts",
        ),
        &["result"], // "resolved", "not_found", "failed", "skipped"
    )
    .unwrap()
});

/// Requests sent to the metadata provider by result.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "codex_provider_requests_total",
            "Total metadata provider search requests",
        ),
        &["result"], // "match", "no_match", "error"
    )
    .unwrap()
});

/// Access token exchanges with the provider's auth endpoint.
pub static TOKEN_REFRESHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "codex_provider_token_refreshes_total",
        "Total provider access token requests",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Finished jobs by kind and terminal state.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("codex_jobs_finished_total", "Total background jobs finished"),
        &["kind", "state"],
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("codex_job_duration_seconds", "Duration of background jobs")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Scan
        Box::new(SCANNED_CANDIDATES.clone()),
        Box::new(SCAN_ROOT_ERRORS.clone()),
        Box::new(GAMES_CREATED.clone()),
        // Resolution
        Box::new(RESOLVE_ATTEMPTS.clone()),
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(TOKEN_REFRESHES.clone()),
        // Jobs
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
    ]
}
