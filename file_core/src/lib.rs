//! Core library for the file upload service: storage, metadata and HTTP routes.

pub mod config;
pub mod database;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;

pub use config::AppConfig;
pub use database::{DatabaseManager, get_database_pool, run_migrations};
pub use error::{AppError, Result};
pub use files::{FileCandidate, FileMetadata, FileRecord, FileRepository, FileStore, FileStoreConfig};
pub use handlers::routes::create_routes;

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

/// Room left for multipart boundaries and the classification fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub db_manager: DatabaseManager,
    pub file_store: FileStore,
}

impl AppState {
    pub fn new(db_manager: DatabaseManager, file_store: FileStore) -> Self {
        Self {
            app_name: "File Manager".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_manager,
            file_store,
        }
    }

    /// Connects to the configured database, applies migrations and prepares
    /// the storage root.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let pool = get_database_pool(&config.database).await?;
        run_migrations(pool.clone()).await?;

        let file_store = FileStore::new(
            config.storage.file_store_config(),
            FileRepository::new(pool.clone()),
        );
        file_store.initialize().await?;

        Ok(Self::new(DatabaseManager::new(pool), file_store))
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, &AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let body_limit = state
        .file_store
        .config()
        .validation
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::cors::cors_layer_from_config(&config.cors))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
