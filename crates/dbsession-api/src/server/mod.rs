//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dbsession_common::{AppConfig, AppError};
use dbsession_db::{PoolStrategy, SessionManager};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router();
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Build an `AppState` around a manager the caller constructed
pub fn create_app_state_with(
    config: AppConfig,
    strategy: PoolStrategy,
) -> Result<AppState, AppError> {
    let manager = SessionManager::new(&config.database, strategy).map_err(AppError::database)?;
    Ok(AppState::new(Arc::new(manager), config))
}

/// Initialize the process-wide session manager and create `AppState`
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!(
        url = %config.database.redacted_url(),
        use_pool = config.database.use_pool,
        "Initializing session manager"
    );
    let manager = SessionManager::initialize(&config.database, config.database.use_pool)
        .await
        .map_err(AppError::database)?;

    Ok(AppState::new(manager, config))
}

/// Run the HTTP server until ctrl-c
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Server(format!("Invalid listen address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state);

    let result = run_server(app, addr).await;
    SessionManager::shutdown().await;
    result
}
