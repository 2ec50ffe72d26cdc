//! IGDB API client.
//!
//! IGDB authenticates through Twitch's OAuth client-credentials flow. The
//! bearer token is cached and refreshed only when it is about to expire;
//! concurrent callers wait on the same refresh.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::throttle::Throttle;
use super::{GameMetadata, MetadataResolver, ResolverError};
use crate::config::ProviderConfig;
use crate::metrics;

/// Fields requested for every lookup.
const LOOKUP_FIELDS: &str =
    "name, cover.url, summary, rating, first_release_date, genres.name, platforms.name";

#[derive(Debug, Clone)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

/// IGDB metadata resolver.
pub struct IgdbResolver {
    client: Client,
    credentials: Option<Credentials>,
    auth_url: String,
    base_url: String,
    refresh_margin: Duration,
    token: Mutex<Option<AccessToken>>,
    throttle: Throttle,
}

impl IgdbResolver {
    /// Create a new client.
    ///
    /// Missing credentials are not an error here; lookups then fail with
    /// `NotConfigured`.
    pub fn new(config: &ProviderConfig) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let credentials = if config.has_credentials() {
            Some(Credentials {
                client_id: config.client_id.clone().unwrap_or_default(),
                client_secret: config.client_secret.clone().unwrap_or_default(),
            })
        } else {
            info!("IGDB credentials not set, metadata lookups are disabled");
            None
        };

        Ok(Self {
            client,
            credentials,
            auth_url: config.auth_url.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            refresh_margin: Duration::from_secs(config.token_refresh_margin_secs),
            token: Mutex::new(None),
            throttle: Throttle::new(config.requests_per_second),
        })
    }

    /// Return a valid bearer token, fetching a new one if needed.
    ///
    /// The lock is held across the exchange so only one refresh is in flight.
    async fn access_token(&self, credentials: &Credentials) -> Result<String, ResolverError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(self.refresh_margin) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(credentials).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken, ResolverError> {
        debug!("Requesting IGDB access token");
        metrics::TOKEN_REFRESHES.inc();

        let response = self
            .client
            .post(&self.auth_url)
            .query(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| ResolverError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ResolverError::Auth(format!("Failed to parse token response: {}", e))
        })?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn query_games(
        &self,
        credentials: &Credentials,
        query: &str,
    ) -> Result<Option<GameMetadata>, ResolverError> {
        let token = self.access_token(credentials).await?;
        self.throttle.acquire().await;

        let url = format!("{}/games", self.base_url);
        let body = format!(
            "search \"{}\"; fields {}; limit 1;",
            escape_query(query),
            LOOKUP_FIELDS
        );

        debug!("IGDB search: query='{}'", query);

        let response = self
            .client
            .post(&url)
            .header("Client-ID", &credentials.client_id)
            .bearer_auth(&token)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            // Revoked early; the next call fetches a new one
            self.invalidate_token().await;
            return Err(ResolverError::Auth("access token rejected".to_string()));
        }
        if status == 429 {
            return Err(ResolverError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let games: Vec<IgdbGame> = response.json().await.map_err(|e| {
            ResolverError::Parse(format!("Failed to parse game search response: {}", e))
        })?;

        games.into_iter().next().map(GameMetadata::try_from).transpose()
    }
}

#[async_trait]
impl MetadataResolver for IgdbResolver {
    async fn lookup(&self, query: &str) -> Result<Option<GameMetadata>, ResolverError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ResolverError::NotConfigured("IGDB client id and secret are required".to_string())
        })?;

        let result = self.query_games(credentials, query).await;

        let label = match &result {
            Ok(Some(_)) => "match",
            Ok(None) => "no_match",
            Err(_) => "error",
        };
        metrics::PROVIDER_REQUESTS.with_label_values(&[label]).inc();

        result
    }
}

/// Escape a query for use inside an Apicalypse string literal.
fn escape_query(query: &str) -> String {
    query.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Swap the thumbnail size token for the big cover one and make the URL
/// absolute.
pub(crate) fn upgrade_cover_url(url: &str) -> String {
    let url = url.replace("t_thumb", "t_cover_big");
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url
    }
}

fn format_release_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

// ============================================================================
// IGDB API response types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct IgdbGame {
    id: u64,
    name: Option<String>,
    summary: Option<String>,
    rating: Option<f64>,
    first_release_date: Option<i64>,
    cover: Option<IgdbImage>,
    #[serde(default)]
    genres: Vec<IgdbNamed>,
    #[serde(default)]
    platforms: Vec<IgdbNamed>,
}

#[derive(Debug, Deserialize)]
struct IgdbImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgdbNamed {
    name: Option<String>,
}

impl TryFrom<IgdbGame> for GameMetadata {
    type Error = ResolverError;

    fn try_from(game: IgdbGame) -> Result<Self, Self::Error> {
        let title = game
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ResolverError::Parse(format!("game {} has no name", game.id)))?;

        Ok(GameMetadata {
            remote_id: game.id,
            title,
            release_date: game.first_release_date.and_then(format_release_date),
            platforms: game.platforms.into_iter().filter_map(|p| p.name).collect(),
            cover_url: game
                .cover
                .and_then(|c| c.url)
                .map(|url| upgrade_cover_url(&url)),
            summary: game.summary,
            rating: game.rating,
            genres: game.genres.into_iter().filter_map(|g| g.name).collect(),
        })
    }
}
