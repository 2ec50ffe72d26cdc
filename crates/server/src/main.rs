use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codex_core::{
    load_config, load_config_from_env, validate_config, CatalogStore, ConfigError, IgdbResolver,
    JobManager, MetadataResolver, PathScanner, SqliteCatalogStore,
};

use codex_server::api::create_router;
use codex_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("codex {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("CODEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; a missing file means defaults plus environment
    info!("Loading configuration from {:?}", config_path);
    let config = match load_config(&config_path) {
        Err(ConfigError::FileNotFound(_)) => {
            warn!(
                "No config file at {:?}, using defaults and environment",
                config_path
            );
            load_config_from_env().context("Failed to load config from environment")?
        }
        other => other.with_context(|| format!("Failed to load config from {:?}", config_path))?,
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Create SQLite catalog store
    let store: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalogStore::new(&config.database.path)
            .context("Failed to create catalog store")?,
    );
    info!("Catalog store initialized");

    // Create metadata resolver
    let resolver: Arc<dyn MetadataResolver> = Arc::new(
        IgdbResolver::new(&config.provider).context("Failed to create metadata resolver")?,
    );
    info!("Metadata provider at {}", config.provider.base_url);

    let scanner = Arc::new(PathScanner::from_config(&config.scanner));

    // Create job manager
    let jobs = Arc::new(JobManager::new(
        Arc::clone(&store),
        scanner,
        Arc::clone(&resolver),
        config.jobs.max_retained,
    ));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        resolver,
        Arc::clone(&jobs),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Running jobs stop at their next root or entry boundary
    info!("Server shutting down...");
    jobs.shutdown();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
