//! # dbsession-db
//!
//! Connection pooling and session management over SQLx.
//!
//! ## Overview
//!
//! - Pool factory with a bounded queue strategy and an unbounded null strategy
//! - Sessions with explicit transactions and idempotent close
//! - A process-wide session manager
//! - PostgreSQL and in-memory connection backends
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dbsession_common::DatabaseConfig;
//! use dbsession_db::{PgSessionConnection, SessionManager};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let manager = SessionManager::initialize(&config, config.use_pool).await?;
//!
//!     let mut session = manager.acquire_session().await?;
//!     let conn = session.connection::<PgSessionConnection>().await?;
//!     sqlx::query("SELECT 1").execute(conn.as_pg()).await?;
//!     session.commit().await?;
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod manager;
pub mod pool;
pub mod session;

// Re-export commonly used types
pub use connection::{
    Connection, Connector, MemoryConnection, MemoryConnector, MemoryStore, PgConnector,
    PgSessionConnection,
};
pub use error::{DbError, DbResult};
pub use manager::SessionManager;
pub use pool::{
    build_pool, build_pool_with_connector, connector_for, BoundedPoolOptions, ConnectionPool,
    PoolStatus, PoolStrategy, PooledConnection,
};
pub use session::{Session, SessionState};
