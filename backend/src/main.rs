//! Notekeeper Backend Server
//!
//! Selects the storage and media backends from the environment, then serves
//! the API until Ctrl+C or SIGTERM.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use notekeeper_server::config::{Config, StorageBackend};
use notekeeper_server::media::{CloudinaryStore, ImageStore, MemoryImageStore};
use notekeeper_server::routes::{app_router, API_PREFIX};
use notekeeper_server::state::{AppState, Backends};
use notekeeper_server::storage::{MemoryStore, PgStore};
use notekeeper_server::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Notekeeper");

    let backends = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config)
                .await
                .context("database connection")?;
            db::run_migrations(&pool).await.context("database migrations")?;
            Backends::from_store(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Backends::from_store(MemoryStore::new())
        }
    };

    let images: Arc<dyn ImageStore> = match config.cloudinary.clone() {
        Some(cloudinary) => Arc::new(
            CloudinaryStore::new(cloudinary).context("image store client")?,
        ),
        None => {
            tracing::warn!("Cloudinary credentials not set, keeping images in memory");
            Arc::new(MemoryImageStore::new())
        }
    };

    let app_state = AppState::new(backends, images, &config);
    let app = app_router(app_state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}{}/healthcheck", addr, API_PREFIX);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
