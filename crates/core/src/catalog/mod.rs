//! Game catalog - scan roots, the ignore list and catalog entries.
//!
//! The store is the only shared mutable resource. Uniqueness of a game's
//! path is enforced by the storage layer, so concurrent ingestion and manual
//! import can never produce duplicate entries.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogStore;
pub use types::*;

use std::sync::Arc;

use crate::resolver::GameMetadata;

/// Trait for catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Register a scan root. Registering an existing path returns the
    /// existing record.
    fn add_scan_root(&self, path: &str) -> Result<ScanRoot, CatalogError>;

    /// List all scan roots, oldest first.
    fn list_scan_roots(&self) -> Result<Vec<ScanRoot>, CatalogError>;

    /// Add a path to the ignore list. Idempotent like `add_scan_root`.
    fn add_ignored_path(&self, path: &str) -> Result<IgnoredPath, CatalogError>;

    /// List all ignored paths, oldest first.
    fn list_ignored_paths(&self) -> Result<Vec<IgnoredPath>, CatalogError>;

    /// List games matching the filter, oldest first.
    fn list_games(&self, filter: &GameFilter) -> Result<Vec<Game>, CatalogError>;

    /// Get a game by id.
    fn get_game(&self, id: &str) -> Result<Game, CatalogError>;

    /// Find a game by exact path.
    fn find_by_path(&self, path: &str) -> Result<Option<Game>, CatalogError>;

    /// Create `PENDING` entries for every path not already present.
    ///
    /// Runs as a single transaction; returns the number of entries created.
    fn insert_if_absent(&self, games: &[NewGame]) -> Result<u32, CatalogError>;

    /// Create virtual entries from bare names.
    ///
    /// Names are trimmed; blank names are dropped without being counted and
    /// names matching an existing extracted name are skipped.
    fn import_titles(&self, names: &[String]) -> Result<ImportSummary, CatalogError>;

    /// Apply a manual edit. Status changes must be valid manual transitions.
    fn update_game(&self, id: &str, update: &GameUpdate) -> Result<Game, CatalogError>;

    /// Attach metadata and mark the game `RESOLVED`.
    ///
    /// With `only_if` set, the write happens only while the game's current
    /// status is one of the given statuses, checked inside the same
    /// statement. Returns `None` when the guard rejected the write.
    fn apply_metadata(
        &self,
        id: &str,
        metadata: &GameMetadata,
        only_if: Option<&[GameStatus]>,
    ) -> Result<Option<Game>, CatalogError>;

    /// Delete a game by id.
    fn delete_game(&self, id: &str) -> Result<(), CatalogError>;

    /// Open an independent connection to the same catalog, for work that
    /// outlives the request that started it.
    fn open_session(&self) -> Result<Arc<dyn CatalogStore>, CatalogError>;
}
