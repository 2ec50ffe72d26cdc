use std::sync::Arc;

use codex_core::{
    BulkResolver, CatalogStore, Config, JobManager, MetadataResolver, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn CatalogStore>,
    resolver: Arc<dyn MetadataResolver>,
    jobs: Arc<JobManager>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        resolver: Arc<dyn MetadataResolver>,
        jobs: Arc<JobManager>,
    ) -> Self {
        Self {
            config,
            store,
            resolver,
            jobs,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Request-scoped catalog store.
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        &self.jobs
    }

    /// Resolver for single-entry, on-request lookups.
    pub fn bulk_resolver(&self) -> BulkResolver {
        BulkResolver::new(Arc::clone(&self.store), Arc::clone(&self.resolver))
    }
}
