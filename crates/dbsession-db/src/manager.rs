//! Session manager
//!
//! [`SessionManager`] owns one [`ConnectionPool`] and hands out sessions
//! bound to it. An application normally keeps a single manager for the whole
//! process, registered with [`SessionManager::initialize`] and fetched with
//! [`SessionManager::current`]. Tests and embedders that want explicit wiring
//! build one with [`SessionManager::new`] and pass it around instead.

use std::sync::Arc;

use dbsession_common::DatabaseConfig;
use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::error::{DbError, DbResult};
use crate::pool::{build_pool, ConnectionPool, PoolStatus, PoolStrategy};
use crate::session::Session;

static GLOBAL: RwLock<Option<Arc<SessionManager>>> = parking_lot::const_rwlock(None);

pub struct SessionManager {
    pool: ConnectionPool,
}

impl SessionManager {
    /// Build a manager for `config` with an explicit strategy
    pub fn new(config: &DatabaseConfig, strategy: PoolStrategy) -> DbResult<Self> {
        tracing::info!(
            url = %config.redacted_url(),
            strategy = %strategy,
            "Creating session manager"
        );
        let pool = build_pool(config, strategy)?;
        Ok(Self { pool })
    }

    /// Build a manager using the config's own `use_pool` flag
    pub fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        Self::new(config, PoolStrategy::from_flag(config.use_pool))
    }

    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Build a manager and make it the process-wide instance.
    ///
    /// Calling this again replaces the instance. The previous manager's idle
    /// connections are closed; sessions already handed out keep working and
    /// return their connections to the old pool when they finish.
    pub async fn initialize(config: &DatabaseConfig, use_pooling: bool) -> DbResult<Arc<Self>> {
        let manager = Arc::new(Self::new(config, PoolStrategy::from_flag(use_pooling))?);

        let previous = GLOBAL.write().replace(Arc::clone(&manager));
        if let Some(previous) = previous {
            tracing::info!("Replacing session manager");
            previous.dispose().await;
        }

        Ok(manager)
    }

    /// The process-wide instance
    pub fn current() -> DbResult<Arc<Self>> {
        GLOBAL.read().clone().ok_or(DbError::NotInitialized)
    }

    /// Clear the process-wide instance and close its idle connections
    pub async fn shutdown() {
        let previous = GLOBAL.write().take();
        if let Some(previous) = previous {
            previous.dispose().await;
            tracing::info!("Session manager shut down");
        }
    }

    /// Open a new session on this manager's pool.
    ///
    /// The caller owns the session and should [`Session::close`] it; dropping
    /// it also releases the connection. Use [`SessionManager::scope`] to have
    /// that handled for you.
    pub async fn acquire_session(&self) -> DbResult<Session> {
        let conn = self.pool.acquire().await?;
        tracing::debug!(connection_id = conn.id(), "Session opened");
        Ok(Session::new(conn))
    }

    /// Run `f` with a fresh session and close it afterwards, whatever the
    /// outcome. Nothing is committed on the caller's behalf.
    ///
    /// ```rust,ignore
    /// let value = manager
    ///     .scope(|session| Box::pin(async move {
    ///         let conn = session.connection::<MemoryConnection>().await?;
    ///         conn.put("greeting", "hello")?;
    ///         session.commit().await?;
    ///         Ok::<_, DbError>(())
    ///     }))
    ///     .await?;
    /// ```
    pub async fn scope<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<DbError>,
    {
        let mut session = self.acquire_session().await?;
        let result = f(&mut session).await;
        session.close().await;
        result
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn strategy(&self) -> PoolStrategy {
        self.pool.strategy()
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Close idle connections held by this manager's pool
    pub async fn dispose(&self) {
        self.pool.dispose().await;
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("pool", &self.pool)
            .finish()
    }
}
