//! Application state
//!
//! Holds the shared state for the Axum application: the injected session
//! manager and the configuration it was built from.

use std::sync::Arc;

use dbsession_common::AppConfig;
use dbsession_db::SessionManager;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionManager>,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, config: AppConfig) -> Self {
        Self {
            sessions,
            config: Arc::new(config),
        }
    }

    /// Session manager every request draws its sessions from
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("config", &"AppConfig")
            .finish()
    }
}
