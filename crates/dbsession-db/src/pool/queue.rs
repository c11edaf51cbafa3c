//! Bounded queue pool
//!
//! Checked-out connections are bounded by a semaphore holding
//! `base_size + max_overflow` permits. Tokio's semaphore is fair, so waiters
//! are served in arrival order. Returned connections go to the back of a FIFO
//! idle queue of at most `base_size` entries; anything beyond that is an
//! overflow connection and is closed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::strategy::BoundedPoolOptions;
use super::{PoolCore, RawConnection};
use crate::error::{DbError, DbResult};

pub struct QueuePool {
    core: PoolCore,
    options: BoundedPoolOptions,
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<RawConnection>>,
    recycled: AtomicU64,
}

impl QueuePool {
    pub(crate) fn new(core: PoolCore, options: BoundedPoolOptions) -> Self {
        Self {
            core,
            permits: Arc::new(Semaphore::new(options.capacity())),
            idle: Mutex::new(VecDeque::with_capacity(options.base_size)),
            options,
            recycled: AtomicU64::new(0),
        }
    }

    pub(crate) fn core(&self) -> &PoolCore {
        &self.core
    }

    pub fn options(&self) -> &BoundedPoolOptions {
        &self.options
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn recycled_count(&self) -> u64 {
        self.recycled.load(Ordering::Relaxed)
    }

    /// Slots left before acquirers start waiting
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub(crate) async fn checkout(&self) -> DbResult<(RawConnection, OwnedSemaphorePermit)> {
        let permit = match tokio::time::timeout(
            self.options.acquire_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(DbError::connection("connection pool is closed")),
            Err(_) => {
                tracing::warn!(
                    capacity = self.options.capacity(),
                    timeout = ?self.options.acquire_timeout,
                    "Connection pool exhausted"
                );
                return Err(DbError::PoolExhausted {
                    capacity: self.options.capacity(),
                    timeout: self.options.acquire_timeout,
                });
            }
        };

        // Holding a permit: reuse the oldest idle connection unless it is due for recycling
        loop {
            let candidate = self.idle.lock().pop_front();
            let Some(raw) = candidate else { break };

            if raw.age() >= self.options.recycle {
                tracing::debug!(
                    connection_id = raw.id,
                    age = ?raw.age(),
                    "Recycling stale connection"
                );
                self.recycled.fetch_add(1, Ordering::Relaxed);
                raw.close().await;
                continue;
            }

            return Ok((raw, permit));
        }

        // Nothing reusable. On connect failure the permit drops with this frame.
        let raw = self.core.open_connection().await?;
        Ok((raw, permit))
    }

    /// Park a returned connection. Returns it back when the idle queue is
    /// already full, in which case the caller must close it.
    pub(crate) fn checkin(&self, raw: RawConnection) -> Option<RawConnection> {
        let mut idle = self.idle.lock();
        if idle.len() < self.options.base_size {
            idle.push_back(raw);
            None
        } else {
            Some(raw)
        }
    }

    pub(crate) fn drain_idle(&self) -> Vec<RawConnection> {
        self.idle.lock().drain(..).collect()
    }
}

impl std::fmt::Debug for QueuePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePool")
            .field("options", &self.options)
            .field("available", &self.available())
            .field("idle", &self.idle_count())
            .finish()
    }
}
