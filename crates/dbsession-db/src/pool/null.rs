//! Null pool: no reuse, no limit

use super::{PoolCore, RawConnection};
use crate::error::DbResult;

/// Opens a physical connection per checkout; release closes it.
pub struct NullPool {
    core: PoolCore,
}

impl NullPool {
    pub(crate) fn new(core: PoolCore) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &PoolCore {
        &self.core
    }

    pub(crate) async fn checkout(&self) -> DbResult<RawConnection> {
        self.core.open_connection().await
    }
}

impl std::fmt::Debug for NullPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NullPool")
            .field("open", &self.core.open_count())
            .finish()
    }
}
