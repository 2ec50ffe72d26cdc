//! Types for remote metadata lookups.

use serde::{Deserialize, Serialize};

/// Metadata for the single best match of a lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameMetadata {
    /// Provider game id.
    pub remote_id: u64,
    /// Canonical title.
    pub title: String,
    /// First release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Absolute `https` URL of the large cover variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Provider rating, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl GameMetadata {
    /// Minimal metadata with just an id and title.
    pub fn new(remote_id: u64, title: impl Into<String>) -> Self {
        Self {
            remote_id,
            title: title.into(),
            ..Default::default()
        }
    }
}
