//! Metadata resolution for catalog entries.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{push_error, ResolveOutcome, ResolveSummary};
use crate::catalog::{CatalogError, CatalogStore, Game, GameFilter, GameStatus};
use crate::metrics;
use crate::resolver::MetadataResolver;

/// Statuses a user may resolve on request. `RESOLVED` entries are refreshed.
const ON_REQUEST: [GameStatus; 3] = [
    GameStatus::Pending,
    GameStatus::Approved,
    GameStatus::Resolved,
];

/// Looks up metadata for catalog entries, one entry at a time.
pub struct BulkResolver {
    store: Arc<dyn CatalogStore>,
    resolver: Arc<dyn MetadataResolver>,
}

impl BulkResolver {
    pub fn new(store: Arc<dyn CatalogStore>, resolver: Arc<dyn MetadataResolver>) -> Self {
        Self { store, resolver }
    }

    /// Resolve every `PENDING` or `APPROVED` entry.
    ///
    /// A failed lookup or write is counted and logged and the run moves on;
    /// earlier successes are kept. Cancellation is checked between entries.
    pub async fn resolve_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ResolveSummary, CatalogError> {
        let games = self.store.list_games(&GameFilter::eligible())?;
        info!("Bulk resolving {} game(s)", games.len());

        let mut summary = ResolveSummary::default();

        for game in games {
            if cancel.is_cancelled() {
                info!("Bulk resolve cancelled after {} game(s)", summary.attempted);
                summary.cancelled = true;
                break;
            }

            summary.attempted += 1;
            self.resolve_entry(&game, &mut summary).await;
        }

        info!(
            "Bulk resolve finished: {}/{} resolved, {} not found, {} failed",
            summary.resolved, summary.attempted, summary.not_found, summary.failed
        );

        Ok(summary)
    }

    async fn resolve_entry(&self, game: &Game, summary: &mut ResolveSummary) {
        debug!("Resolving {:?} ({})", game.extracted_name, game.id);

        let metadata = match self.resolver.lookup(&game.extracted_name).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!("No metadata found for {:?}", game.extracted_name);
                metrics::RESOLVE_ATTEMPTS
                    .with_label_values(&["not_found"])
                    .inc();
                summary.not_found += 1;
                return;
            }
            Err(e) => {
                warn!("Failed to resolve {:?}: {}", game.extracted_name, e);
                metrics::RESOLVE_ATTEMPTS.with_label_values(&["failed"]).inc();
                summary.failed += 1;
                push_error(
                    &mut summary.errors,
                    format!("{}: {}", game.extracted_name, e),
                );
                return;
            }
        };

        // The guard keeps entries moved to IGNORED/LOCAL meanwhile untouched
        match self
            .store
            .apply_metadata(&game.id, &metadata, Some(&GameStatus::ELIGIBLE))
        {
            Ok(Some(_)) => {
                metrics::RESOLVE_ATTEMPTS
                    .with_label_values(&["resolved"])
                    .inc();
                summary.resolved += 1;
            }
            Ok(None) | Err(CatalogError::NotFound(_)) => {
                debug!("{} changed while resolving, leaving it alone", game.id);
                metrics::RESOLVE_ATTEMPTS.with_label_values(&["skipped"]).inc();
                summary.skipped += 1;
            }
            Err(e) => {
                warn!("Failed to store metadata for {}: {}", game.id, e);
                metrics::RESOLVE_ATTEMPTS.with_label_values(&["failed"]).inc();
                summary.failed += 1;
                push_error(
                    &mut summary.errors,
                    format!("{}: {}", game.extracted_name, e),
                );
            }
        }
    }

    /// Resolve a single entry on request.
    ///
    /// Provider failures are reported as no match. Entries marked `IGNORED`
    /// or `LOCAL` must be moved back to `PENDING` first.
    pub async fn resolve_one(&self, id: &str) -> Result<ResolveOutcome, CatalogError> {
        let game = self.store.get_game(id)?;

        if !ON_REQUEST.contains(&game.status) {
            return Err(CatalogError::InvalidTransition {
                id: game.id,
                from: game.status,
                to: GameStatus::Resolved,
            });
        }

        let Some(metadata) = self.resolver.search(&game.extracted_name).await else {
            metrics::RESOLVE_ATTEMPTS
                .with_label_values(&["not_found"])
                .inc();
            return Ok(ResolveOutcome::NoMatch(game));
        };

        match self.store.apply_metadata(id, &metadata, Some(&ON_REQUEST))? {
            Some(resolved) => {
                metrics::RESOLVE_ATTEMPTS
                    .with_label_values(&["resolved"])
                    .inc();
                Ok(ResolveOutcome::Resolved(resolved))
            }
            None => {
                // Status changed while the lookup was in flight
                let current = self.store.get_game(id)?;
                Err(CatalogError::InvalidTransition {
                    id: current.id,
                    from: current.status,
                    to: GameStatus::Resolved,
                })
            }
        }
    }
}
