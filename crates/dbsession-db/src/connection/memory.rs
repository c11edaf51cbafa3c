//! In-process transactional key/value store
//!
//! Backs the `memory://` URL scheme. Writes made through a connection stay
//! private to it until commit (read-committed), which is enough to observe
//! session isolation, pool reuse and connection counts without a server.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Connection, Connector};
use crate::error::{DbError, DbResult};

/// Shared committed state plus connection bookkeeping.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    unreachable: AtomicBool,
    open: AtomicUsize,
    opened_total: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate an outage (`false`) or recovery (`true`)
    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        !self.unreachable.load(Ordering::SeqCst)
    }

    /// Physical connections currently open against this store
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Physical connections ever opened against this store
    pub fn total_connections(&self) -> u64 {
        self.opened_total.load(Ordering::SeqCst)
    }

    /// Committed value for a key, bypassing any connection
    pub fn committed(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    fn check_reachable(&self) -> DbResult<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(DbError::connection("memory store is unreachable"))
        }
    }
}

/// Connector for a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    name: String,
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self::named("default", store)
    }

    pub fn named(name: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> DbResult<Box<dyn Connection>> {
        self.store.check_reachable()?;
        self.store.open.fetch_add(1, Ordering::SeqCst);
        self.store.opened_total.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
            pending: None,
        }))
    }

    fn describe(&self) -> String {
        format!("memory://{}", self.name)
    }
}

/// One connection to a [`MemoryStore`].
///
/// `None` in the pending map records a delete.
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    pending: Option<HashMap<String, Option<String>>>,
}

impl MemoryConnection {
    /// Read a key: this connection's uncommitted writes first, then committed data
    pub fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.store.check_reachable()?;

        if let Some(value) = self.pending.as_ref().and_then(|p| p.get(key)) {
            return Ok(value.clone());
        }
        Ok(self.store.committed(key))
    }

    /// Stage a write; it becomes visible to other connections on commit
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> DbResult<()> {
        self.store.check_reachable()?;
        self.pending
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Some(value.into()));
        Ok(())
    }

    /// Stage a delete
    pub fn delete(&mut self, key: impl Into<String>) -> DbResult<()> {
        self.store.check_reachable()?;
        self.pending
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), None);
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn begin(&mut self) -> DbResult<()> {
        self.store.check_reachable()?;
        self.pending.get_or_insert_with(HashMap::new);
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.store.check_reachable()?;
        if let Some(pending) = self.pending.take() {
            let mut data = self.store.data.write();
            for (key, value) in pending {
                match value {
                    Some(value) => data.insert(key, value),
                    None => data.remove(&key),
                };
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.pending = None;
        self.store.check_reachable()
    }

    async fn ping(&mut self) -> DbResult<()> {
        self.store.check_reachable()
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        // Bookkeeping happens in Drop so abrupt drops are counted too
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.store.open.fetch_sub(1, Ordering::SeqCst);
    }
}
