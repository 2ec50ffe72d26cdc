//! Ingests scan results into the catalog.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::types::{push_error, IngestSummary};
use crate::catalog::{CatalogError, CatalogStore, IgnoredPath, NewGame, ScanRoot};
use crate::metrics;
use crate::scanner::PathScanner;

/// Turns discovered candidates into `PENDING` catalog entries.
///
/// Re-running over an unchanged filesystem creates nothing: existing paths
/// are never touched and ignored paths are never created.
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    scanner: Arc<PathScanner>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>, scanner: Arc<PathScanner>) -> Self {
        Self { store, scanner }
    }

    /// Scan every registered root against the current ignore list.
    pub fn run(&self, cancel: &CancellationToken) -> Result<IngestSummary, CatalogError> {
        let roots = self.store.list_scan_roots()?;
        let ignored = self.store.list_ignored_paths()?;
        self.ingest(&roots, &ignored, cancel)
    }

    /// Scan `roots` one at a time and create the surviving candidates in a
    /// single transaction.
    ///
    /// Cancellation is checked between roots; candidates from roots scanned
    /// before the signal are still committed.
    pub fn ingest(
        &self,
        roots: &[ScanRoot],
        ignored: &[IgnoredPath],
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, CatalogError> {
        let ignored: HashSet<&str> = ignored.iter().map(|p| p.path.as_str()).collect();
        let mut summary = IngestSummary::default();
        let mut pending: Vec<NewGame> = Vec::new();

        for root in roots {
            if cancel.is_cancelled() {
                info!("Scan cancelled after {} root(s)", summary.roots_scanned);
                summary.cancelled = true;
                break;
            }

            if ignored.contains(root.path.as_str()) {
                debug!("Skipping ignored root {}", root.path);
                summary.roots_ignored += 1;
                continue;
            }

            let scan = self.scanner.scan(Path::new(&root.path));
            summary.roots_scanned += 1;

            if let Some(error) = scan.error {
                metrics::SCAN_ROOT_ERRORS.inc();
                push_error(&mut summary.errors, error.to_string());
            }

            for entry in scan.entries {
                summary.candidates += 1;
                if ignored.contains(entry.path.as_str()) {
                    debug!("Skipping ignored path {}", entry.path);
                    summary.skipped_ignored += 1;
                    continue;
                }
                pending.push(NewGame::from(entry));
            }
        }

        metrics::SCANNED_CANDIDATES.inc_by(summary.candidates as u64);

        let created = self.store.insert_if_absent(&pending)?;
        metrics::GAMES_CREATED
            .with_label_values(&["scan"])
            .inc_by(created as u64);

        summary.created = created;
        summary.skipped_existing = (pending.len() as u32).saturating_sub(created);

        info!(
            "Ingest finished: {} created, {} already catalogued, {} ignored",
            summary.created, summary.skipped_existing, summary.skipped_ignored
        );

        Ok(summary)
    }
}
