//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use codex_core::testing::{fixtures, MockResolver};
//!
//! let resolver = MockResolver::new();
//! resolver.add_match("Hades", fixtures::metadata(1113, "Hades")).await;
//!
//! // Use in AppState or a BulkResolver...
//! ```

mod mock_resolver;

pub use mock_resolver::MockResolver;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::NewGame;
    use crate::resolver::GameMetadata;

    /// Metadata with reasonable defaults for every field.
    pub fn metadata(remote_id: u64, title: &str) -> GameMetadata {
        GameMetadata {
            remote_id,
            title: title.to_string(),
            release_date: Some("2020-09-17".to_string()),
            platforms: vec!["PC (Microsoft Windows)".to_string()],
            cover_url: Some(format!(
                "https://images.igdb.com/igdb/image/upload/t_cover_big/co{}.jpg",
                remote_id
            )),
            summary: Some(format!("{} is a game.", title)),
            rating: Some(87.5),
            genres: vec!["Adventure".to_string()],
        }
    }

    /// A discovered entry under `/library`.
    pub fn new_game(name: &str) -> NewGame {
        NewGame {
            path: format!("/library/{}", name),
            name_on_disk: name.to_string(),
            extracted_name: name.to_string(),
        }
    }
}
