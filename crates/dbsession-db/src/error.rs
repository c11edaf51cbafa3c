//! Error types for pool construction and session handling

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the pool factory, the pools and sessions.
///
/// Nothing in this crate retries: every variant reaches the caller unchanged.
#[derive(Debug, Error)]
pub enum DbError {
    /// Missing or malformed connection URL, or invalid pool options.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bounded pool stayed at capacity for the whole acquisition timeout.
    #[error("Connection pool exhausted: {capacity} connections checked out, timed out after {timeout:?}")]
    PoolExhausted { capacity: usize, timeout: Duration },

    /// Store unreachable or the connection was dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement-level failure reported by the driver.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Session connection is not a {0}")]
    ConnectionType(&'static str),

    #[error("Session manager has not been initialized")]
    NotInitialized,
}

impl DbError {
    /// Get a stable error code for logs and API bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::PoolExhausted { .. } => "POOL_EXHAUSTED",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::ConnectionType(_) => "CONNECTION_TYPE_MISMATCH",
            Self::NotInitialized => "NOT_INITIALIZED",
        }
    }

    /// Whether a caller may reasonably retry later (with backoff)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::Connection(_))
    }

    /// Whether the physical connection that produced this error must be discarded
    #[must_use]
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub(crate) fn configuration(msg: impl std::fmt::Display) -> Self {
        Self::Configuration(msg.to_string())
    }

    pub(crate) fn connection(msg: impl std::fmt::Display) -> Self {
        Self::Connection(msg.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Configuration(source) => Self::Configuration(source.to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(e.to_string()),
            _ => Self::Database(e.to_string()),
        }
    }
}

/// Result type for pool and session operations
pub type DbResult<T> = Result<T, DbError>;
