//! Types for the game catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::resolver::GameMetadata;

/// Scheme used for entries created by manual import rather than discovery.
pub const VIRTUAL_PATH_SCHEME: &str = "virtual://";

/// Lifecycle status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Just discovered, unresolved.
    Pending,
    /// Manually confirmed, still awaiting metadata.
    Approved,
    /// Metadata attached.
    Resolved,
    /// Excluded from automatic resolution.
    Ignored,
    /// User asserts no remote metadata exists or is wanted.
    Local,
}

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Metadata resolution (single or bulk).
    Automatic,
    /// A user edit.
    Manual,
}

impl GameStatus {
    pub const ALL: [GameStatus; 5] = [
        GameStatus::Pending,
        GameStatus::Approved,
        GameStatus::Resolved,
        GameStatus::Ignored,
        GameStatus::Local,
    ];

    /// Statuses the bulk resolver picks up.
    pub const ELIGIBLE: [GameStatus; 2] = [GameStatus::Pending, GameStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Pending => "PENDING",
            GameStatus::Approved => "APPROVED",
            GameStatus::Resolved => "RESOLVED",
            GameStatus::Ignored => "IGNORED",
            GameStatus::Local => "LOCAL",
        }
    }

    /// Returns true if automatic metadata resolution may select this entry.
    pub fn is_eligible_for_resolution(&self) -> bool {
        Self::ELIGIBLE.contains(self)
    }

    /// Returns true if automation never touches entries in this state.
    pub fn is_terminal_for_automation(&self) -> bool {
        matches!(self, GameStatus::Ignored | GameStatus::Local)
    }

    /// Returns true if moving from `self` to `next` is allowed for `trigger`.
    ///
    /// Staying in the same state is always allowed.
    pub fn can_transition(&self, next: GameStatus, trigger: Trigger) -> bool {
        use GameStatus::*;

        if *self == next {
            return true;
        }

        match trigger {
            Trigger::Automatic => self.is_eligible_for_resolution() && next == Resolved,
            Trigger::Manual => match next {
                Ignored | Local | Pending => true,
                Approved => matches!(self, Pending | Resolved),
                // Metadata only arrives through a lookup.
                Resolved => false,
            },
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::InvalidInput(format!("Unknown game status: {}", s)))
    }
}

/// A filesystem directory registered for scanning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRoot {
    pub id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// An exact path that never becomes a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredPath {
    pub id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// A discovered or imported game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    /// Unique identity key. Imported titles use `virtual://<name>`.
    pub path: String,
    pub name_on_disk: String,
    /// Normalized title guess used as the search query.
    pub extracted_name: String,
    pub status: GameStatus,
    /// Provider id. Metadata fields are meaningful only while `RESOLVED`
    /// and are left in place if the entry is later moved away.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Free-text tag naming the drive or shelf the game lives on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    /// True for entries created by manual import.
    pub fn is_virtual(&self) -> bool {
        self.path.starts_with(VIRTUAL_PATH_SCHEME)
    }

    /// Copy provider metadata onto this entry and mark it resolved.
    pub fn apply_metadata(&mut self, metadata: &GameMetadata) {
        self.remote_id = Some(metadata.remote_id);
        self.title = Some(metadata.title.clone());
        self.release_date = metadata.release_date.clone();
        self.platforms = metadata.platforms.clone();
        self.cover_url = metadata.cover_url.clone();
        self.summary = metadata.summary.clone();
        self.rating = metadata.rating;
        self.genres = metadata.genres.clone();
        self.status = GameStatus::Resolved;
    }
}

/// A new entry to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub path: String,
    pub name_on_disk: String,
    pub extracted_name: String,
}

impl NewGame {
    /// An imported title with a synthetic path.
    pub fn virtual_entry(name: &str) -> Self {
        Self {
            path: format!("{}{}", VIRTUAL_PATH_SCHEME, name),
            name_on_disk: name.to_string(),
            extracted_name: name.to_string(),
        }
    }
}

impl From<crate::scanner::DiscoveredEntry> for NewGame {
    fn from(entry: crate::scanner::DiscoveredEntry) -> Self {
        Self {
            path: entry.path,
            name_on_disk: entry.name_on_disk,
            extracted_name: entry.extracted_name,
        }
    }
}

/// User-editable fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameUpdate {
    #[serde(default)]
    pub extracted_name: Option<String>,
    #[serde(default)]
    pub status: Option<GameStatus>,
    /// `Some(None)` clears the tag, `None` leaves it alone.
    #[serde(default, deserialize_with = "double_option")]
    pub storage_location: Option<Option<String>>,
}

impl GameUpdate {
    pub fn is_empty(&self) -> bool {
        self.extracted_name.is_none() && self.status.is_none() && self.storage_location.is_none()
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filter for listing games.
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    /// Only these statuses; empty means all.
    pub statuses: Vec<GameStatus>,
}

impl GameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_statuses(mut self, statuses: &[GameStatus]) -> Self {
        self.statuses.extend_from_slice(statuses);
        self
    }

    /// Entries the bulk resolver should visit.
    pub fn eligible() -> Self {
        Self::new().with_statuses(&GameStatus::ELIGIBLE)
    }
}

/// Result of a manual import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: u32,
    pub skipped: u32,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot move game {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: GameStatus,
        to: GameStatus,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Database(e.to_string())
    }
}
