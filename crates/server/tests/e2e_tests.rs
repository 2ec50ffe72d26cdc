//! End-to-end tests with a mocked metadata provider.
//!
//! These tests run the full router in-process against a temp-file SQLite
//! database and a real library directory.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{fixtures, TestFixture};

async fn import(fixture: &TestFixture, names: &[&str]) -> Value {
    let response = fixture.post("/api/v1/games/import", json!(names)).await;
    assert_eq!(response.status, StatusCode::OK);
    response.body
}

async fn game_by_name(fixture: &TestFixture, name: &str) -> Value {
    let response = fixture.get("/api/v1/games").await;
    response.body["games"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["extracted_name"] == name)
        .cloned()
        .unwrap_or_else(|| panic!("no game named {}", name))
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_secret() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["provider"]["client_secret_configured"], false);
    assert!(response.body["provider"].get("client_secret").is_none());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap();
    assert!(text.contains("codex_http_requests_total"));
    assert!(text.contains("codex_games"));
}

// =============================================================================
// Scan Roots and Ignore List
// =============================================================================

#[tokio::test]
async fn test_register_scan_root_is_idempotent() {
    let fixture = TestFixture::new().await;

    let first = fixture
        .post("/api/v1/scan-roots", json!({ "path": "/mnt/games" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = fixture
        .post("/api/v1/scan-roots", json!({ "path": "/mnt/games" }))
        .await;
    assert_eq!(second.body["id"], first.body["id"]);

    let list = fixture.get("/api/v1/scan-roots").await;
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["scan_roots"][0]["path"], "/mnt/games");
}

#[tokio::test]
async fn test_blank_path_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/scan-roots", json!({ "path": "   " }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post("/api/v1/ignored-paths", json!({ "path": "" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ignored_paths_listed() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/ignored-paths", json!({ "path": "/mnt/games/tmp" }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let list = fixture.get("/api/v1/ignored-paths").await;
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["ignored_paths"][0]["path"], "/mnt/games/tmp");
}

// =============================================================================
// Scanning
// =============================================================================

#[tokio::test]
async fn test_scan_creates_pending_entries() {
    let fixture = TestFixture::new().await;
    fixture.add_game_dir("Cyberpunk.2077-CODEX");
    fixture.add_game_dir("Some.Game.v1.2.3-SKIDROW");

    let job = fixture.scan_library().await;
    assert_eq!(job["state"], "completed");
    assert_eq!(job["kind"], "scan");
    assert_eq!(job["summary"]["created"], 2);

    let games = fixture.get("/api/v1/games?status=PENDING").await;
    assert_eq!(games.body["total"], 2);

    let game = game_by_name(&fixture, "Cyberpunk 2077").await;
    assert_eq!(game["name_on_disk"], "Cyberpunk.2077-CODEX");
    assert_eq!(game["path"], fixture.library_path("Cyberpunk.2077-CODEX"));
    game_by_name(&fixture, "Some Game").await;
}

#[tokio::test]
async fn test_rescan_creates_nothing_new() {
    let fixture = TestFixture::new().await;
    fixture.add_game_dir("Hades");
    fixture.add_game_dir("Celeste");

    fixture.scan_library().await;
    let second = fixture.scan_library().await;

    assert_eq!(second["summary"]["created"], 0);
    assert_eq!(second["summary"]["skipped_existing"], 2);
    assert_eq!(fixture.get("/api/v1/games").await.body["total"], 2);
}

#[tokio::test]
async fn test_ignored_path_never_catalogued() {
    let fixture = TestFixture::new().await;
    fixture.add_game_dir("Hades");
    fixture.add_game_dir("Junk_Folder");
    fixture
        .post(
            "/api/v1/ignored-paths",
            json!({ "path": fixture.library_path("Junk_Folder") }),
        )
        .await;

    for _ in 0..2 {
        let job = fixture.scan_library().await;
        assert_eq!(job["summary"]["skipped_ignored"], 1);
    }

    let games = fixture.get("/api/v1/games").await;
    assert_eq!(games.body["total"], 1);
    assert_eq!(games.body["games"][0]["extracted_name"], "Hades");
}

#[tokio::test]
async fn test_scan_with_missing_root_reports_error() {
    let fixture = TestFixture::new().await;
    fixture.add_game_dir("Hades");
    fixture
        .post(
            "/api/v1/scan-roots",
            json!({ "path": "/definitely/not/a/library" }),
        )
        .await;

    let job = fixture.scan_library().await;
    assert_eq!(job["state"], "completed");
    assert_eq!(job["summary"]["created"], 1);
    assert_eq!(job["summary"]["errors"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Games
// =============================================================================

#[tokio::test]
async fn test_import_skips_blank_and_duplicate_names() {
    let fixture = TestFixture::new().await;

    let body = import(&fixture, &["Hades", "  ", "Celeste", "Hades"]).await;
    assert_eq!(body["imported"], 2);
    assert_eq!(body["skipped"], 1);

    let game = game_by_name(&fixture, "Hades").await;
    assert_eq!(game["path"], "virtual://Hades");
    assert_eq!(game["status"], "PENDING");

    let again = import(&fixture, &["Celeste"]).await;
    assert_eq!(again["imported"], 0);
}

#[tokio::test]
async fn test_malformed_import_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/games/import", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_games_with_invalid_status() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/games?status=DOWNLOADING").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_nonexistent_game() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/games/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].is_string());

    let response = fixture
        .put("/api/v1/games/does-not-exist", json!({ "status": "LOCAL" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fixture.delete("/api/v1/games/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_game_fields() {
    let fixture = TestFixture::new().await;
    import(&fixture, &["Outer Wilds"]).await;
    let id = game_by_name(&fixture, "Outer Wilds").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/v1/games/{}", id);

    let response = fixture
        .put(
            &path,
            json!({ "status": "APPROVED", "storage_location": "Drive B" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "APPROVED");
    assert_eq!(response.body["storage_location"], "Drive B");
    assert_eq!(response.body["extracted_name"], "Outer Wilds");

    let response = fixture
        .put(&path, json!({ "storage_location": null }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.get("storage_location").is_none());
    assert_eq!(response.body["status"], "APPROVED");
}

#[tokio::test]
async fn test_update_game_rejections() {
    let fixture = TestFixture::new().await;
    import(&fixture, &["Hades"]).await;
    let id = game_by_name(&fixture, "Hades").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/v1/games/{}", id);

    let response = fixture.put(&path, json!({ "status": "RESOLVED" })).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = fixture.put(&path, json!({ "extracted_name": " " })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let game = fixture.get(&path).await;
    assert_eq!(game.body["status"], "PENDING");
    assert_eq!(game.body["extracted_name"], "Hades");
}

#[tokio::test]
async fn test_delete_game() {
    let fixture = TestFixture::new().await;
    import(&fixture, &["Hades"]).await;
    let id = game_by_name(&fixture, "Hades").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = fixture.delete(&format!("/api/v1/games/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = fixture.get(&format!("/api/v1/games/{}", id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_single_game() {
    let fixture = TestFixture::new().await;
    fixture
        .resolver
        .add_match("Hades", fixtures::metadata(1113, "Hades"))
        .await;
    import(&fixture, &["Hades"]).await;
    let id = game_by_name(&fixture, "Hades").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = fixture
        .post_empty(&format!("/api/v1/games/{}/resolve", id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resolved"], true);
    assert_eq!(response.body["game"]["status"], "RESOLVED");
    assert_eq!(response.body["game"]["remote_id"], 1113);
    assert_eq!(response.body["game"]["title"], "Hades");
    assert!(response.body["game"]["cover_url"]
        .as_str()
        .unwrap()
        .contains("t_cover_big"));
}

#[tokio::test]
async fn test_resolve_single_game_no_match() {
    let fixture = TestFixture::new().await;
    import(&fixture, &["Unknown Indie Thing"]).await;
    let id = game_by_name(&fixture, "Unknown Indie Thing").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = fixture
        .post_empty(&format!("/api/v1/games/{}/resolve", id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resolved"], false);
    assert_eq!(response.body["message"], "No metadata found");
    assert_eq!(response.body["game"]["status"], "PENDING");
}

#[tokio::test]
async fn test_resolve_single_game_provider_failure_is_no_match() {
    let fixture = TestFixture::new().await;
    fixture.resolver.fail_on("Hades").await;
    import(&fixture, &["Hades"]).await;
    let id = game_by_name(&fixture, "Hades").await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = fixture
        .post_empty(&format!("/api/v1/games/{}/resolve", id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["resolved"], false);
}

#[tokio::test]
async fn test_resolve_ignored_game_conflicts() {
    let fixture = TestFixture::new().await;
    fixture
        .resolver
        .add_match("Hades", fixtures::metadata(1113, "Hades"))
        .await;
    import(&fixture, &["Hades"]).await;
    let id = game_by_name(&fixture, "Hades").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    fixture
        .put(&format!("/api/v1/games/{}", id), json!({ "status": "IGNORED" }))
        .await;

    let response = fixture
        .post_empty(&format!("/api/v1/games/{}/resolve", id))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(fixture.resolver.query_count().await, 0);
}

#[tokio::test]
async fn test_bulk_resolve_partial_failure() {
    let fixture = TestFixture::new().await;
    fixture
        .resolver
        .add_match("Alpha", fixtures::metadata(1, "Alpha"))
        .await;
    fixture.resolver.fail_on("Beta").await;
    fixture
        .resolver
        .add_match("Gamma", fixtures::metadata(3, "Gamma"))
        .await;
    import(&fixture, &["Alpha", "Beta", "Gamma"]).await;

    let response = fixture.post_empty("/api/v1/games/resolve-all").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["job"]["state"], "running");

    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["state"], "completed");
    assert_eq!(job["summary"]["resolved"], 2);
    assert_eq!(job["summary"]["failed"], 1);

    assert_eq!(game_by_name(&fixture, "Alpha").await["status"], "RESOLVED");
    assert_eq!(game_by_name(&fixture, "Beta").await["status"], "PENDING");
    assert_eq!(game_by_name(&fixture, "Gamma").await["status"], "RESOLVED");
}

#[tokio::test]
async fn test_bulk_resolve_leaves_ignored_and_local_alone() {
    let fixture = TestFixture::new().await;
    for name in ["Hades", "Celeste", "Outer Wilds"] {
        fixture
            .resolver
            .add_match(name, fixtures::metadata(7, name))
            .await;
    }
    import(&fixture, &["Hades", "Celeste", "Outer Wilds"]).await;

    for (name, status) in [("Celeste", "IGNORED"), ("Outer Wilds", "LOCAL")] {
        let id = game_by_name(&fixture, name).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        fixture
            .put(&format!("/api/v1/games/{}", id), json!({ "status": status }))
            .await;
    }

    let response = fixture.post_empty("/api/v1/games/resolve-all").await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["summary"]["attempted"], 1);

    assert_eq!(game_by_name(&fixture, "Hades").await["status"], "RESOLVED");
    assert_eq!(game_by_name(&fixture, "Celeste").await["status"], "IGNORED");
    assert_eq!(game_by_name(&fixture, "Outer Wilds").await["status"], "LOCAL");
    assert_eq!(fixture.resolver.recorded_queries().await, vec!["Hades"]);
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_cancel_bulk_resolve() {
    let fixture = TestFixture::new().await;
    fixture
        .resolver
        .set_delay(Duration::from_millis(100))
        .await;
    import(&fixture, &["One", "Two", "Three", "Four", "Five"]).await;

    let response = fixture.post_empty("/api/v1/games/resolve-all").await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();

    let response = fixture
        .post_empty(&format!("/api/v1/jobs/{}/cancel", job_id))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["state"], "cancelled");
    assert!(job["summary"]["attempted"].as_u64().unwrap() < 5);
}

#[tokio::test]
async fn test_unknown_job() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/jobs/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fixture.post_empty("/api/v1/jobs/nope/cancel").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_jobs() {
    let fixture = TestFixture::new().await;
    fixture.scan_library().await;
    let response = fixture.post_empty("/api/v1/games/resolve-all").await;
    fixture
        .wait_for_job(response.body["job_id"].as_str().unwrap())
        .await;

    let response = fixture.get("/api/v1/jobs").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    assert_eq!(response.body["jobs"][0]["kind"], "bulk_resolve");
    assert_eq!(response.body["jobs"][1]["kind"], "scan");
}
