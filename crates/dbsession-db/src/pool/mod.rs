//! Database connection pool management
//!
//! [`ConnectionPool`] has two variants selected by [`PoolStrategy`]:
//! a bounded queue pool that reuses connections and a null pool that opens
//! one connection per checkout. Both hand out [`PooledConnection`]s, which
//! go back to where they came from on release or drop.

mod factory;
mod null;
mod queue;
mod strategy;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedSemaphorePermit;
use tokio::time::Instant;

use crate::connection::{Connection, Connector};
use crate::error::DbResult;

pub use factory::{build_pool, build_pool_with_connector, connector_for};
pub use null::NullPool;
pub use queue::QueuePool;
pub use strategy::{
    BoundedPoolOptions, PoolStrategy, DEFAULT_MAX_OVERFLOW, DEFAULT_POOL_RECYCLE,
    DEFAULT_POOL_SIZE, DEFAULT_POOL_TIMEOUT,
};

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub strategy: &'static str,
    /// Connections currently held by sessions
    pub checked_out: usize,
    /// Connections parked in the idle queue (always 0 when unbounded)
    pub idle: usize,
    /// Physical connections open right now, idle or checked out
    pub open: usize,
    /// Ceiling on checked-out connections, `None` when unbounded
    pub capacity: Option<usize>,
    /// Idle connections replaced because they reached the recycle age
    pub recycled: u64,
}

/// State shared by both pool variants: where connections come from and
/// how many exist.
pub(crate) struct PoolCore {
    connector: Arc<dyn Connector>,
    next_id: AtomicU64,
    open: Arc<AtomicUsize>,
    checked_out: AtomicUsize,
}

impl PoolCore {
    fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            next_id: AtomicU64::new(1),
            open: Arc::new(AtomicUsize::new(0)),
            checked_out: AtomicUsize::new(0),
        }
    }

    async fn open_connection(&self) -> DbResult<RawConnection> {
        let conn = self.connector.connect().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.open.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(connection_id = id, store = %self.connector.describe(), "Opened connection");

        Ok(RawConnection {
            id,
            created_at: Instant::now(),
            conn,
            _open: OpenGuard(Arc::clone(&self.open)),
        })
    }

    fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn checked_out_count(&self) -> usize {
        self.checked_out.load(Ordering::SeqCst)
    }
}

/// Decrements the pool's open-connection count when the connection goes away.
struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A physical connection plus the metadata the pool needs.
pub(crate) struct RawConnection {
    id: u64,
    created_at: Instant,
    conn: Box<dyn Connection>,
    _open: OpenGuard,
}

impl RawConnection {
    fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    async fn close(self) {
        let id = self.id;
        if let Err(e) = self.conn.close().await {
            tracing::debug!(connection_id = id, error = %e, "Error while closing connection");
        } else {
            tracing::debug!(connection_id = id, "Closed connection");
        }
    }

    /// Close on a background task when a runtime is around, otherwise drop
    fn close_detached(self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.close());
            }
            Err(_) => drop(self),
        }
    }
}

/// Connection pool in one of the two strategies. Cheap to clone.
#[derive(Clone)]
pub enum ConnectionPool {
    Queue(Arc<QueuePool>),
    Null(Arc<NullPool>),
}

impl ConnectionPool {
    pub(crate) fn new(connector: Arc<dyn Connector>, strategy: PoolStrategy) -> Self {
        let core = PoolCore::new(connector);
        match strategy {
            PoolStrategy::Bounded(options) => Self::Queue(Arc::new(QueuePool::new(core, options))),
            PoolStrategy::Unbounded => Self::Null(Arc::new(NullPool::new(core))),
        }
    }

    fn core(&self) -> &PoolCore {
        match self {
            Self::Queue(pool) => pool.core(),
            Self::Null(pool) => pool.core(),
        }
    }

    /// Check out a connection.
    ///
    /// Never waits for the unbounded strategy. The bounded strategy waits up
    /// to its acquire timeout for a slot and then fails with `PoolExhausted`.
    pub async fn acquire(&self) -> DbResult<PooledConnection> {
        let (raw, permit) = match self {
            Self::Queue(pool) => {
                let (raw, permit) = pool.checkout().await?;
                (raw, Some(permit))
            }
            Self::Null(pool) => (pool.checkout().await?, None),
        };

        self.core().checked_out.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(connection_id = raw.id, "Checked out connection");

        Ok(PooledConnection {
            raw: Some(raw),
            pool: self.clone(),
            permit,
            broken: false,
            in_transaction: false,
        })
    }

    async fn checkin(&self, raw: RawConnection, discard: bool) {
        self.core().checked_out.fetch_sub(1, Ordering::SeqCst);
        match self {
            Self::Queue(pool) if !discard => {
                if let Some(excess) = pool.checkin(raw) {
                    excess.close().await;
                }
            }
            _ => raw.close().await,
        }
    }

    fn checkin_detached(&self, raw: RawConnection, discard: bool) {
        self.core().checked_out.fetch_sub(1, Ordering::SeqCst);
        match self {
            Self::Queue(pool) if !discard => {
                if let Some(excess) = pool.checkin(raw) {
                    excess.close_detached();
                }
            }
            _ => raw.close_detached(),
        }
    }

    pub fn strategy(&self) -> PoolStrategy {
        match self {
            Self::Queue(pool) => PoolStrategy::Bounded(*pool.options()),
            Self::Null(_) => PoolStrategy::Unbounded,
        }
    }

    pub fn status(&self) -> PoolStatus {
        let core = self.core();
        let (idle, recycled) = match self {
            Self::Queue(pool) => (pool.idle_count(), pool.recycled_count()),
            Self::Null(_) => (0, 0),
        };

        PoolStatus {
            strategy: self.strategy().name(),
            checked_out: core.checked_out_count(),
            idle,
            open: core.open_count(),
            capacity: self.strategy().capacity(),
            recycled,
        }
    }

    /// Redacted description of the store this pool connects to
    pub fn target(&self) -> String {
        self.core().connector.describe()
    }

    /// Close every idle connection. Checked-out connections are unaffected
    /// and the pool stays usable; new connections are opened on demand.
    pub async fn dispose(&self) {
        if let Self::Queue(pool) = self {
            let drained = pool.drain_idle();
            let count = drained.len();
            for raw in drained {
                raw.close().await;
            }
            tracing::info!(closed = count, store = %self.target(), "Disposed connection pool");
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("strategy", &self.strategy())
            .field("status", &self.status())
            .finish()
    }
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Returning it is automatic on drop; [`PooledConnection::release`] does the
/// same but awaits any close instead of spawning it. A connection that is
/// broken or may still be inside a transaction is closed instead of reused.
pub struct PooledConnection {
    raw: Option<RawConnection>,
    pool: ConnectionPool,
    // Held for the checkout's lifetime; dropped after the connection is back in the idle queue
    permit: Option<OwnedSemaphorePermit>,
    broken: bool,
    // Set before BEGIN is sent, cleared once COMMIT/ROLLBACK completes
    in_transaction: bool,
}

impl PooledConnection {
    /// Pool-unique id of the physical connection
    pub fn id(&self) -> u64 {
        self.raw.as_ref().map_or(0, |raw| raw.id)
    }

    /// Time since the physical connection was opened
    pub fn age(&self) -> Duration {
        self.raw.as_ref().map_or(Duration::ZERO, RawConnection::age)
    }

    /// Never return this connection to the idle queue; close it on release
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Whether a transaction may be open on the physical connection
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub(crate) fn set_in_transaction(&mut self, in_transaction: bool) {
        self.in_transaction = in_transaction;
    }

    fn discard_on_return(&self) -> bool {
        self.broken || self.in_transaction
    }

    /// The physical connection; `None` only once the handle has been released
    pub fn connection_mut(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        match self.raw.as_mut() {
            Some(raw) => Some(raw.conn.as_mut()),
            None => None,
        }
    }

    pub async fn release(mut self) {
        if let Some(raw) = self.raw.take() {
            let discard = self.discard_on_return();
            tracing::debug!(connection_id = raw.id, discard, "Releasing connection");
            self.pool.checkin(raw, discard).await;
        }
        drop(self.permit.take());
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            let discard = self.discard_on_return();
            tracing::debug!(connection_id = raw.id, discard, "Releasing connection on drop");
            self.pool.checkin_detached(raw, discard);
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id())
            .field("broken", &self.broken)
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}
