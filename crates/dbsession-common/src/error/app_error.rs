//! Application error types
//!
//! Errors raised while wiring the process together: loading configuration,
//! building the session manager and binding the HTTP listener.

use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Database errors (pool construction, unreachable store)
    #[error("Database error: {0}")]
    Database(String),

    // Listener / serve errors
    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// Stable error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Server(_) => "SERVER_ERROR",
        }
    }

    /// Create a database error
    #[must_use]
    pub fn database(msg: impl fmt::Display) -> Self {
        Self::Database(msg.to_string())
    }
}
