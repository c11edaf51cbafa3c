//! Route definitions

use axum::{routing::get, Router};

use crate::handlers::{health, status};
use crate::state::AppState;

/// Create the main router: health probes plus the versioned API
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/pool", get(status::pool_status))
        .route("/session", get(status::session_check))
}
