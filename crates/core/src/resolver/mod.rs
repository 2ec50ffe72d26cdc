//! Remote game metadata lookups.
//!
//! The provider is best-effort infrastructure: callers that only want an
//! answer use [`MetadataResolver::search`], which turns every failure into
//! "not found". Callers that count failures use [`MetadataResolver::lookup`].

mod igdb;
mod throttle;
mod types;

pub use igdb::IgdbResolver;
pub use throttle::{Throttle, TokenBucket};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when talking to the metadata provider.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Credentials are missing.
    #[error("Metadata provider not configured: {0}")]
    NotConfigured(String),

    /// Token exchange failed or the token was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport failure, including timeouts.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider asked us to slow down.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimited,

    /// Provider returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// A source of game metadata.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Look up the single best match for `query`.
    async fn lookup(&self, query: &str) -> Result<Option<GameMetadata>, ResolverError>;

    /// Like `lookup`, but every failure is logged and reported as no match.
    async fn search(&self, query: &str) -> Option<GameMetadata> {
        match self.lookup(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Metadata lookup for {:?} failed: {}", query, e);
                None
            }
        }
    }
}
