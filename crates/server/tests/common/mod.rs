//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock metadata resolver injected, enabling E2E testing without a
//! provider account.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use codex_core::config::{DatabaseConfig, ServerConfig};
use codex_core::{
    testing::MockResolver, CatalogStore, Config, JobManager, MetadataResolver, PathScanner,
    SqliteCatalogStore,
};
use codex_server::state::AppState;

/// Re-export fixtures for test convenience
pub use codex_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_scan() {
///     let fixture = TestFixture::new().await;
///     fixture.add_game_dir("Hades");
///     fixture.post("/api/v1/scan-roots", json!({ "path": fixture.library_root() })).await;
///
///     let response = fixture.post_empty("/api/v1/scan").await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock resolver - configure provider matches and failures
    pub resolver: Arc<MockResolver>,
    /// Store behind the router, for direct setup and assertions
    pub store: Arc<SqliteCatalogStore>,
    /// Temporary directory for test database and game library
    pub temp_dir: TempDir,
    /// Scannable library directory inside `temp_dir`
    pub library_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let library_dir = temp_dir.path().join("library");
        std::fs::create_dir_all(&library_dir).expect("Failed to create library dir");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };

        let resolver = Arc::new(MockResolver::new());
        let store =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to create catalog store"));
        let scanner = Arc::new(PathScanner::from_config(&config.scanner));

        let jobs = Arc::new(JobManager::new(
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            scanner,
            Arc::clone(&resolver) as Arc<dyn MetadataResolver>,
            config.jobs.max_retained,
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&resolver) as Arc<dyn MetadataResolver>,
            jobs,
        ));

        let router = codex_server::api::create_router(state);

        Self {
            router,
            resolver,
            store,
            temp_dir,
            library_dir,
        }
    }

    /// Library directory as a string, ready for a scan-root body.
    pub fn library_root(&self) -> String {
        self.library_dir.to_string_lossy().into_owned()
    }

    /// Absolute path of a library child.
    pub fn library_path(&self, name: &str) -> String {
        self.library_dir.join(name).to_string_lossy().into_owned()
    }

    /// Create a game folder in the library.
    pub fn add_game_dir(&self, name: &str) {
        std::fs::create_dir_all(self.library_dir.join(name)).expect("Failed to create game dir");
    }

    /// Register the library as a scan root and run a scan to completion.
    pub async fn scan_library(&self) -> Value {
        self.post(
            "/api/v1/scan-roots",
            serde_json::json!({ "path": self.library_root() }),
        )
        .await;
        let response = self.post_empty("/api/v1/scan").await;
        assert_eq!(response.status, StatusCode::ACCEPTED);
        let job_id = response.body["job_id"].as_str().unwrap().to_string();
        self.wait_for_job(&job_id).await
    }

    /// Poll a job until it leaves the running state and return its record.
    pub async fn wait_for_job(&self, id: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/jobs/{}", id)).await;
            assert_eq!(response.status, StatusCode::OK);
            if response.body["state"] != "running" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}
