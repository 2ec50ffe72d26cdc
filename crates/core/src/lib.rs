pub mod catalog;
pub mod config;
pub mod jobs;
pub mod metrics;
pub mod normalizer;
pub mod resolver;
pub mod scanner;
pub mod testing;

pub use catalog::{
    CatalogError, CatalogStore, Game, GameFilter, GameStatus, GameUpdate, IgnoredPath,
    ImportSummary, NewGame, ScanRoot, SqliteCatalogStore, Trigger,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use jobs::{
    BulkResolver, IngestSummary, JobError, JobKind, JobManager, JobRecord, JobState, JobSummary,
    Reconciler, ResolveOutcome, ResolveSummary,
};
pub use normalizer::NameNormalizer;
pub use resolver::{GameMetadata, IgdbResolver, MetadataResolver, ResolverError};
pub use scanner::{DiscoveredEntry, PathScanner, RootScan, ScanError};
