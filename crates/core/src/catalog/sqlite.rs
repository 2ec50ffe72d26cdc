//! SQLite-backed catalog store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    CatalogError, CatalogStore, Game, GameFilter, GameStatus, GameUpdate, IgnoredPath,
    ImportSummary, NewGame, ScanRoot, Trigger,
};
use crate::resolver::GameMetadata;

/// How long a connection waits on a lock held by another session.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const GAME_COLUMNS: &str = "id, path, name_on_disk, extracted_name, status, remote_id, title, \
     release_date, platforms, cover_url, summary, rating, genres, storage_location, created_at";

/// Columns added after the first schema version, with their definitions.
const GAME_COLUMN_MIGRATIONS: &[(&str, &str)] = &[
    ("remote_id", "INTEGER"),
    ("release_date", "TEXT"),
    ("platforms", "TEXT"),
    ("genres", "TEXT"),
    ("storage_location", "TEXT"),
];

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    /// Named shared-cache URI, so every session sees the same database.
    Memory(String),
}

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
    location: Location,
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `path`.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        Self::open(Location::File(path.to_path_buf()))
    }

    /// Create an in-memory catalog (useful for testing).
    ///
    /// Sessions opened from it share the same data for as long as this store
    /// is alive.
    pub fn in_memory() -> Result<Self, CatalogError> {
        Self::open(Location::Memory(format!(
            "file:codex-{}?mode=memory&cache=shared",
            Uuid::new_v4()
        )))
    }

    fn open(location: Location) -> Result<Self, CatalogError> {
        let conn = Self::connect(&location)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    fn connect(location: &Location) -> Result<Connection, CatalogError> {
        let conn = match location {
            Location::File(path) => Connection::open(path),
            Location::Memory(uri) => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            ),
        }
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(conn)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scan_roots (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ignored_paths (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                name_on_disk TEXT NOT NULL,
                extracted_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                title TEXT,
                cover_url TEXT,
                summary TEXT,
                rating REAL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_status ON games(status);
            CREATE INDEX IF NOT EXISTS idx_games_extracted_name ON games(extracted_name);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Self::migrate_game_columns(conn)
    }

    /// Bring a games table from an older schema up to the current columns.
    fn migrate_game_columns(conn: &Connection) -> Result<(), CatalogError> {
        let existing = Self::column_names(conn, "games")?;

        for (column, definition) in GAME_COLUMN_MIGRATIONS {
            if existing.iter().any(|c| c == column) {
                continue;
            }
            info!("Migrating catalog: adding games.{}", column);
            conn.execute(
                &format!("ALTER TABLE games ADD COLUMN {} {}", column, definition),
                [],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        // Older databases kept the provider id as text
        if existing.iter().any(|c| c == "igdb_id") {
            let copied = conn
                .execute(
                    "UPDATE games SET remote_id = CAST(igdb_id AS INTEGER)
                     WHERE remote_id IS NULL AND igdb_id IS NOT NULL
                       AND CAST(igdb_id AS INTEGER) > 0",
                    [],
                )
                .map_err(|e| CatalogError::Database(e.to_string()))?;
            if copied > 0 {
                info!("Migrating catalog: copied {} legacy provider id(s)", copied);
            }
        }

        // Older databases kept the storage tag under a drive-specific name
        if existing.iter().any(|c| c == "external_hard_drive_name") {
            conn.execute(
                "UPDATE games SET storage_location = external_hard_drive_name
                 WHERE storage_location IS NULL AND external_hard_drive_name IS NOT NULL",
                [],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        Ok(())
    }

    fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, CatalogError> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| CatalogError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(names)
    }

    fn load_game(conn: &Connection, id: &str) -> Result<Game, CatalogError> {
        conn.query_row(
            &format!("SELECT {} FROM games WHERE id = ?", GAME_COLUMNS),
            params![id],
            Self::row_to_game,
        )
        .optional()?
        .ok_or_else(|| CatalogError::NotFound(format!("game {}", id)))
    }

    fn insert_game(conn: &Connection, game: &NewGame, now: &str) -> Result<bool, CatalogError> {
        let inserted = conn.execute(
            "INSERT INTO games (id, path, name_on_disk, extracted_name, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(path) DO NOTHING",
            params![
                Uuid::new_v4().to_string(),
                game.path,
                game.name_on_disk,
                game.extracted_name,
                GameStatus::Pending.as_str(),
                now,
            ],
        )?;
        Ok(inserted > 0)
    }

    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let status_str: String = row.get(4)?;
        let remote_id: Option<i64> = row.get(5)?;
        let platforms: Option<String> = row.get(8)?;
        let genres: Option<String> = row.get(12)?;
        let created_at_str: String = row.get(14)?;

        Ok(Game {
            id: row.get(0)?,
            path: row.get(1)?,
            name_on_disk: row.get(2)?,
            extracted_name: row.get(3)?,
            status: status_str.parse().map_err(|e: CatalogError| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?,
            remote_id: remote_id.map(|id| id as u64),
            title: row.get(6)?,
            release_date: row.get(7)?,
            platforms: parse_list(platforms),
            cover_url: row.get(9)?,
            summary: row.get(10)?,
            rating: row.get(11)?,
            genres: parse_list(genres),
            storage_location: row.get(13)?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<(String, String, DateTime<Utc>)> {
        let created_at_str: String = row.get(2)?;
        Ok((row.get(0)?, row.get(1)?, parse_timestamp(&created_at_str)))
    }

    /// Insert-if-absent for the path-keyed tables, returning the stored row.
    fn register_path(
        &self,
        table: &str,
        path: &str,
    ) -> Result<(String, String, DateTime<Utc>), CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            &format!(
                "INSERT INTO {} (id, path, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(path) DO NOTHING",
                table
            ),
            params![Uuid::new_v4().to_string(), path, Utc::now().to_rfc3339()],
        )?;

        let record = conn.query_row(
            &format!("SELECT id, path, created_at FROM {} WHERE path = ?", table),
            params![path],
            Self::row_to_record,
        )?;
        Ok(record)
    }

    fn list_paths(&self, table: &str) -> Result<Vec<(String, String, DateTime<Utc>)>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, path, created_at FROM {} ORDER BY created_at, rowid",
            table
        ))?;
        let rows = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn add_scan_root(&self, path: &str) -> Result<ScanRoot, CatalogError> {
        let (id, path, created_at) = self.register_path("scan_roots", path)?;
        Ok(ScanRoot {
            id,
            path,
            created_at,
        })
    }

    fn list_scan_roots(&self) -> Result<Vec<ScanRoot>, CatalogError> {
        Ok(self
            .list_paths("scan_roots")?
            .into_iter()
            .map(|(id, path, created_at)| ScanRoot {
                id,
                path,
                created_at,
            })
            .collect())
    }

    fn add_ignored_path(&self, path: &str) -> Result<IgnoredPath, CatalogError> {
        let (id, path, created_at) = self.register_path("ignored_paths", path)?;
        Ok(IgnoredPath {
            id,
            path,
            created_at,
        })
    }

    fn list_ignored_paths(&self) -> Result<Vec<IgnoredPath>, CatalogError> {
        Ok(self
            .list_paths("ignored_paths")?
            .into_iter()
            .map(|(id, path, created_at)| IgnoredPath {
                id,
                path,
                created_at,
            })
            .collect())
    }

    fn list_games(&self, filter: &GameFilter) -> Result<Vec<Game>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let where_clause = if filter.statuses.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            format!("WHERE status IN ({})", placeholders)
        };
        let sql = format!(
            "SELECT {} FROM games {} ORDER BY created_at, rowid",
            GAME_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let games = stmt
            .query_map(
                params_from_iter(filter.statuses.iter().map(|s| s.as_str())),
                Self::row_to_game,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(games)
    }

    fn get_game(&self, id: &str) -> Result<Game, CatalogError> {
        let conn = self.conn.lock().unwrap();
        Self::load_game(&conn, id)
    }

    fn find_by_path(&self, path: &str) -> Result<Option<Game>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let game = conn
            .query_row(
                &format!("SELECT {} FROM games WHERE path = ?", GAME_COLUMNS),
                params![path],
                Self::row_to_game,
            )
            .optional()?;
        Ok(game)
    }

    fn insert_if_absent(&self, games: &[NewGame]) -> Result<u32, CatalogError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut created = 0;
        for game in games {
            if Self::insert_game(&tx, game, &now)? {
                debug!("Created catalog entry for {}", game.path);
                created += 1;
            }
        }

        tx.commit()?;
        Ok(created)
    }

    fn import_titles(&self, names: &[String]) -> Result<ImportSummary, CatalogError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut summary = ImportSummary::default();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM games WHERE extracted_name = ? LIMIT 1",
                    params![name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            if !exists && Self::insert_game(&tx, &NewGame::virtual_entry(name), &now)? {
                summary.imported += 1;
            } else {
                summary.skipped += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }

    fn update_game(&self, id: &str, update: &GameUpdate) -> Result<Game, CatalogError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let current = Self::load_game(&tx, id)?;

        let extracted_name = match update.extracted_name.as_deref().map(str::trim) {
            Some("") => {
                return Err(CatalogError::InvalidInput(
                    "extracted_name must not be blank".to_string(),
                ))
            }
            Some(name) => name.to_string(),
            None => current.extracted_name.clone(),
        };

        let status = match update.status {
            Some(next) if !current.status.can_transition(next, Trigger::Manual) => {
                return Err(CatalogError::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to: next,
                });
            }
            Some(next) => next,
            None => current.status,
        };

        let storage_location = match &update.storage_location {
            Some(Some(tag)) if !tag.trim().is_empty() => Some(tag.trim().to_string()),
            Some(_) => None,
            None => current.storage_location.clone(),
        };

        tx.execute(
            "UPDATE games SET extracted_name = ?2, status = ?3, storage_location = ?4 WHERE id = ?1",
            params![id, extracted_name, status.as_str(), storage_location],
        )?;

        let updated = Self::load_game(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn apply_metadata(
        &self,
        id: &str,
        metadata: &GameMetadata,
        only_if: Option<&[GameStatus]>,
    ) -> Result<Option<Game>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(metadata.remote_id as i64),
            Box::new(metadata.title.clone()),
            Box::new(metadata.release_date.clone()),
            Box::new(encode_list(&metadata.platforms)),
            Box::new(metadata.cover_url.clone()),
            Box::new(metadata.summary.clone()),
            Box::new(metadata.rating),
            Box::new(encode_list(&metadata.genres)),
            Box::new(GameStatus::Resolved.as_str()),
            Box::new(id.to_string()),
        ];

        let guard = match only_if {
            Some(statuses) => {
                params.extend(
                    statuses
                        .iter()
                        .map(|s| Box::new(s.as_str()) as Box<dyn rusqlite::ToSql>),
                );
                // An empty guard admits nothing
                let placeholders = vec!["?"; statuses.len()].join(", ");
                format!(" AND status IN ({})", placeholders)
            }
            None => String::new(),
        };

        let sql = format!(
            "UPDATE games SET remote_id = ?, title = ?, release_date = ?, platforms = ?,
                 cover_url = ?, summary = ?, rating = ?, genres = ?, status = ?
             WHERE id = ?{}",
            guard
        );

        let changed = conn.execute(&sql, params_from_iter(params.iter()))?;
        if changed == 0 {
            // Distinguish a missing game from a guarded-out one
            let game = Self::load_game(&conn, id)?;
            debug!(
                "Metadata for {} not applied: status is {}",
                game.id, game.status
            );
            return Ok(None);
        }

        Self::load_game(&conn, id).map(Some)
    }

    fn delete_game(&self, id: &str) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM games WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(CatalogError::NotFound(format!("game {}", id)));
        }
        Ok(())
    }

    fn open_session(&self) -> Result<Arc<dyn CatalogStore>, CatalogError> {
        let conn = Self::connect(&self.location)?;
        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
            location: self.location.clone(),
        }))
    }
}

/// Timestamps without an offset, as older databases wrote them; read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc);
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|| {
            warn!("Unparseable timestamp {:?}, using now", value);
            Utc::now()
        })
}

fn encode_list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    serde_json::to_string(values).ok()
}

/// Lists are stored as JSON arrays; older rows used comma-joined text.
fn parse_list(raw: Option<String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    if let Ok(values) = serde_json::from_str::<Vec<String>>(&raw) {
        return values;
    }

    raw.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}
