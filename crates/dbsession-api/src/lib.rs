//! # dbsession-api
//!
//! HTTP surface built with Axum: liveness, readiness and pool status, with
//! the session manager injected through application state.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, create_app_state_with, run, run_server};
pub use state::AppState;
