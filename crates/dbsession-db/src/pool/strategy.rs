//! Pool strategy selection

use std::fmt;
use std::time::Duration;

use crate::error::{DbError, DbResult};

/// Connections kept open and idle between checkouts.
pub const DEFAULT_POOL_SIZE: usize = 5;
/// Extra connections allowed beyond the base size under load.
pub const DEFAULT_MAX_OVERFLOW: usize = 10;
/// How long `acquire` waits for a free slot before failing.
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(30);
/// Idle connections at least this old are replaced instead of reused.
pub const DEFAULT_POOL_RECYCLE: Duration = Duration::from_secs(900);

/// Parameters of the bounded (queue) pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoolOptions {
    pub base_size: usize,
    pub max_overflow: usize,
    pub acquire_timeout: Duration,
    pub recycle: Duration,
}

impl Default for BoundedPoolOptions {
    fn default() -> Self {
        Self {
            base_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            acquire_timeout: DEFAULT_POOL_TIMEOUT,
            recycle: DEFAULT_POOL_RECYCLE,
        }
    }
}

impl BoundedPoolOptions {
    /// Ceiling on concurrently checked-out connections
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.base_size + self.max_overflow
    }

    pub fn with_base_size(mut self, base_size: usize) -> Self {
        self.base_size = base_size;
        self
    }

    pub fn with_max_overflow(mut self, max_overflow: usize) -> Self {
        self.max_overflow = max_overflow;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_recycle(mut self, recycle: Duration) -> Self {
        self.recycle = recycle;
        self
    }

    fn validate(&self) -> DbResult<()> {
        if self.capacity() == 0 {
            return Err(DbError::configuration(
                "pool capacity (base size + overflow) must be at least 1",
            ));
        }
        if self.acquire_timeout.is_zero() {
            return Err(DbError::configuration("pool acquire timeout must be non-zero"));
        }
        if self.recycle.is_zero() {
            return Err(DbError::configuration("pool recycle interval must be non-zero"));
        }
        Ok(())
    }
}

/// How sessions get their connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStrategy {
    /// Reuse up to `base_size` idle connections, allow `max_overflow` more
    /// under load, wait at most `acquire_timeout` for a slot.
    Bounded(BoundedPoolOptions),
    /// Open a fresh connection per session and close it on release.
    Unbounded,
}

impl Default for PoolStrategy {
    fn default() -> Self {
        Self::Bounded(BoundedPoolOptions::default())
    }
}

impl PoolStrategy {
    /// Map the startup pooling flag onto a strategy with the fixed parameters
    #[must_use]
    pub fn from_flag(use_pooling: bool) -> Self {
        if use_pooling {
            Self::default()
        } else {
            Self::Unbounded
        }
    }

    #[must_use]
    pub fn bounded(options: BoundedPoolOptions) -> Self {
        Self::Bounded(options)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bounded(_) => "bounded",
            Self::Unbounded => "unbounded",
        }
    }

    #[must_use]
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// `None` for the unbounded strategy
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Bounded(options) => Some(options.capacity()),
            Self::Unbounded => None,
        }
    }

    pub fn validate(&self) -> DbResult<()> {
        match self {
            Self::Bounded(options) => options.validate(),
            Self::Unbounded => Ok(()),
        }
    }
}

impl fmt::Display for PoolStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(o) => write!(
                f,
                "bounded(size={}, overflow={}, timeout={:?}, recycle={:?})",
                o.base_size, o.max_overflow, o.acquire_timeout, o.recycle
            ),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}
