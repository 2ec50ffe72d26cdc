//! Mock metadata resolver for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::resolver::{GameMetadata, MetadataResolver, ResolverError};

/// Mock implementation of the MetadataResolver trait.
///
/// Provides controllable behavior for testing:
/// - Return configured matches by exact query
/// - Fail specific queries (every time) or the next call (once)
/// - Track queries for assertions
/// - Slow every lookup down, for cancellation tests
///
/// # Example
///
/// ```rust,ignore
/// use codex_core::testing::{MockResolver, fixtures};
///
/// let resolver = MockResolver::new();
/// resolver.add_match("Hades", fixtures::metadata(1113, "Hades")).await;
/// resolver.fail_on("Broken Game").await;
///
/// assert!(resolver.lookup("Hades").await?.is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockResolver {
    /// Matches by exact query.
    matches: Arc<RwLock<HashMap<String, GameMetadata>>>,
    /// Queries that always fail.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Recorded queries, in call order.
    queries: Arc<RwLock<Vec<String>>>,
    /// If set, the next lookup will fail with this error.
    next_error: Arc<RwLock<Option<ResolverError>>>,
    /// Artificial latency per lookup.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockResolver {
    /// Create a mock that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `metadata` for lookups of exactly `query`.
    pub async fn add_match(&self, query: &str, metadata: GameMetadata) {
        self.matches
            .write()
            .await
            .insert(query.to_string(), metadata);
    }

    /// Make every lookup of `query` fail.
    pub async fn fail_on(&self, query: &str) {
        self.failing.write().await.insert(query.to_string());
    }

    /// Set an error to be returned on the next lookup.
    pub async fn set_next_error(&self, error: ResolverError) {
        *self.next_error.write().await = Some(error);
    }

    /// Sleep this long inside every lookup.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    /// Get the number of lookups performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn lookup(&self, query: &str) -> Result<Option<GameMetadata>, ResolverError> {
        self.queries.write().await.push(query.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if self.failing.read().await.contains(query) {
            return Err(ResolverError::Api {
                status: 503,
                message: format!("mock failure for {}", query),
            });
        }

        Ok(self.matches.read().await.get(query).cloned())
    }
}
