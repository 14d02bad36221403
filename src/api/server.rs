//! Excel Query API server
//!
//! HTTP server using Axum. Serves brief lists, single records and cache
//! control for the workbooks in the upload directory.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::EngineConfig;
use crate::engine::ExcelQueryEngine;

/// Largest request body accepted, uploads included
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// API Server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub engine: EngineConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8083,
            engine: EngineConfig::default(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub engine: ExcelQueryEngine,
}

impl AppState {
    pub fn new(engine: ExcelQueryEngine) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            engine,
        }
    }
}

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Query endpoints
        .route("/api/excel_list", post(handlers::excel_list))
        .route("/api/excel_data", post(handlers::excel_data))
        .route("/api/excel_cache/clear", post(handlers::clear_cache))
        // Workbook files
        .route("/api/files", get(handlers::list_files))
        .route("/api/upload", post(handlers::upload_file))
        .route("/api/download", get(handlers::download_file))
        .route("/api/delete", post(handlers::delete_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "excel_query=info,tower_http=info".into()),
        )
        .init();

    ensure_upload_dir(&config.engine.upload_dir)?;
    let engine = ExcelQueryEngine::new(&config.engine)?;
    let app = router(Arc::new(AppState::new(engine)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Excel Query API Server starting on http://{}", addr);
    info!("   Workbooks: {}", config.engine.upload_dir.display());
    info!("   Endpoints: /api/excel_list, /api/excel_data, /api/excel_cache/clear, /api/files, /api/upload, /api/download");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Excel Query API Server shutdown complete");
    Ok(())
}

fn ensure_upload_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        info!("Created upload directory {}", dir.display());
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
