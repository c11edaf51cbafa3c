//! Per-unit-of-work sessions
//!
//! A [`Session`] owns one checked-out connection. Commits are always explicit
//! and nothing is reloaded after a commit, so values read earlier stay as the
//! caller last saw them. Closing is idempotent, and a session that is dropped
//! without being closed (early return, `?`, cancelled future) still rolls back
//! and hands its connection back.

mod state;

use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::pool::PooledConnection;

pub use state::SessionState;

/// Handle for one logical unit of work, bound to one connection.
#[derive(Debug)]
pub struct Session {
    conn: Option<PooledConnection>,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(conn: PooledConnection) -> Self {
        Self {
            conn: Some(conn),
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn in_transaction(&self) -> bool {
        self.state.is_active()
    }

    /// Id of the bound physical connection, `None` once closed
    pub fn connection_id(&self) -> Option<u64> {
        self.conn.as_ref().map(PooledConnection::id)
    }

    fn pooled(&mut self) -> DbResult<&mut PooledConnection> {
        self.conn.as_mut().ok_or(DbError::SessionClosed)
    }

    fn raw(&mut self) -> DbResult<&mut (dyn Connection + 'static)> {
        self.pooled()?
            .connection_mut()
            .ok_or(DbError::SessionClosed)
    }

    /// Invalidate the connection when the store went away, so it is closed
    /// instead of being returned to the idle queue
    fn track<T>(&mut self, result: DbResult<T>) -> DbResult<T> {
        if let Err(e) = &result {
            if e.is_connection_loss() {
                self.invalidate();
            }
        }
        result
    }

    /// Mark the bound connection unusable; it is discarded on release.
    ///
    /// Call this when a query run through [`Session::connection`] reported a
    /// lost connection.
    pub fn invalidate(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            conn.mark_broken();
        }
    }

    /// Start a transaction. No-op when one is already open.
    pub async fn begin(&mut self) -> DbResult<()> {
        if self.state.is_active() {
            return Ok(());
        }
        if !self.state.can_begin() {
            return Err(DbError::SessionClosed);
        }

        // Flagged before the await: if this future is cancelled after BEGIN
        // went out, the connection must not be reused as-is
        self.pooled()?.set_in_transaction(true);
        let result = self.raw()?.begin().await;
        self.track(result)?;
        self.state = SessionState::Active;
        Ok(())
    }

    /// Typed access to the bound connection, beginning a transaction first
    /// if none is open.
    ///
    /// ```rust,ignore
    /// let conn = session.connection::<PgSessionConnection>().await?;
    /// sqlx::query("INSERT INTO notes (body) VALUES ($1)")
    ///     .bind(body)
    ///     .execute(conn.as_pg())
    ///     .await?;
    /// session.commit().await?;
    /// ```
    pub async fn connection<T: Connection>(&mut self) -> DbResult<&mut T> {
        self.begin().await?;
        self.raw()?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(DbError::ConnectionType(std::any::type_name::<T>()))
    }

    /// Commit the open transaction. Without one this only records the state.
    pub async fn commit(&mut self) -> DbResult<()> {
        if self.is_closed() || self.conn.is_none() {
            return Err(DbError::SessionClosed);
        }
        if self.state.is_active() {
            let result = self.raw()?.commit().await;
            self.track(result)?;
            self.pooled()?.set_in_transaction(false);
        }
        self.state = SessionState::Committed;
        Ok(())
    }

    /// Roll back the open transaction. No-op without one.
    pub async fn rollback(&mut self) -> DbResult<()> {
        if self.is_closed() || self.conn.is_none() {
            return Err(DbError::SessionClosed);
        }
        if !self.state.is_active() {
            return Ok(());
        }

        let result = self.raw()?.rollback().await;
        self.state = SessionState::RolledBack;
        match &result {
            Ok(()) => self.pooled()?.set_in_transaction(false),
            Err(_) => self.invalidate(),
        }
        result
    }

    /// Round-trip to the store on the bound connection
    pub async fn ping(&mut self) -> DbResult<()> {
        let result = self.raw()?.ping().await;
        self.track(result)
    }

    /// Release the connection. Safe to call any number of times.
    ///
    /// An open transaction is rolled back first and the session is recorded as
    /// abandoned. The connection is returned (bounded pool) or closed
    /// (unbounded) once the rollback succeeded. If the rollback fails, or this
    /// future is dropped before it finishes, the connection is discarded.
    pub async fn close(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            self.state = SessionState::Closed;
            return;
        };

        if self.state.is_active() {
            self.state = SessionState::Abandoned;
        }
        if conn.in_transaction() {
            if let Some(raw) = conn.connection_mut() {
                match raw.rollback().await {
                    Ok(()) => conn.set_in_transaction(false),
                    Err(e) => {
                        tracing::warn!(connection_id = conn.id(), error = %e, "Rollback on close failed");
                        conn.mark_broken();
                    }
                }
            }
        }

        tracing::debug!(connection_id = conn.id(), state = %self.state, "Closing session");
        conn.release().await;
        self.state = SessionState::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if conn.in_transaction() {
            self.state = SessionState::Abandoned;
            tracing::debug!(connection_id = conn.id(), "Session dropped inside a transaction");

            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Some(raw) = conn.connection_mut() {
                            if raw.rollback().await.is_ok() {
                                conn.set_in_transaction(false);
                            }
                        }
                        conn.release().await;
                    });
                }
                // No runtime to roll back on; the open transaction flag
                // makes the pool close it
                Err(_) => drop(conn),
            }
        } else {
            drop(conn);
        }

        self.state = SessionState::Closed;
    }
}
