use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("codex.db")
}

/// Filesystem scanner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Release-group and packaging noise words dropped from on-disk names.
    /// Matched case-insensitively against whole tokens.
    #[serde(default = "default_blocklist")]
    pub blocklist: Vec<String>,
    /// File suffixes that mark an installer or archive as a game candidate.
    /// Multi-segment suffixes (".tar.gz") are tried before single ones.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            blocklist: default_blocklist(),
            extensions: default_extensions(),
        }
    }
}

pub fn default_blocklist() -> Vec<String> {
    [
        "codex", "plaza", "skidrow", "reloaded", "fitgirl", "dodi", "repack", "wot", "goty",
        "dlc", "multi", "multi5", "update", "v1", "v2", "installer", "setup", "bin", "data",
        "usa", "eur", "jap", "gog", "mechanics",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_extensions() -> Vec<String> {
    [
        ".tar.gz", ".tar.bz2", ".tar.xz", ".zip", ".7z", ".rar", ".iso", ".exe", ".msi", ".pkg",
        ".dmg", ".gz",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Remote metadata provider (IGDB) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// OAuth client id. Lookups are disabled when absent.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret. Lookups are disabled when absent.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Client-credentials token endpoint.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// API base URL (without trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// A cached token is refreshed once it is this close to expiry.
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_secs: u64,
    /// Client-side request budget (default: 4, the provider's limit).
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auth_url: default_auth_url(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token_refresh_margin_secs: default_refresh_margin(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl ProviderConfig {
    /// Both credentials present and non-blank.
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.client_id, &self.client_secret),
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty()
        )
    }
}

fn default_auth_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}

fn default_base_url() -> String {
    "https://api.igdb.com/v4".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_refresh_margin() -> u64 {
    60
}

fn default_requests_per_second() -> u32 {
    4
}

/// Background job bookkeeping.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Finished job records kept for retrieval; older ones are evicted.
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_retained: default_max_retained(),
        }
    }
}

fn default_max_retained() -> usize {
    50
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scanner: ScannerConfig,
    pub provider: SanitizedProviderConfig,
    pub jobs: JobsConfig,
}

/// Sanitized provider config (secret hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub client_secret_configured: bool,
    pub auth_url: String,
    pub base_url: String,
    pub timeout_secs: u32,
    pub token_refresh_margin_secs: u64,
    pub requests_per_second: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let provider = &config.provider;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            scanner: config.scanner.clone(),
            provider: SanitizedProviderConfig {
                client_id: provider.client_id.clone(),
                client_secret_configured: provider
                    .client_secret
                    .as_ref()
                    .is_some_and(|s| !s.is_empty()),
                auth_url: provider.auth_url.clone(),
                base_url: provider.base_url.clone(),
                timeout_secs: provider.timeout_secs,
                token_refresh_margin_secs: provider.token_refresh_margin_secs,
                requests_per_second: provider.requests_per_second,
            },
            jobs: config.jobs.clone(),
        }
    }
}
