//! Scan ingestion, bulk metadata resolution and the background job runner.

mod bulk_resolve;
mod reconcile;
mod runner;
mod types;

pub use bulk_resolve::BulkResolver;
pub use reconcile::Reconciler;
pub use runner::JobManager;
pub use types::*;
