//! Physical connection backends
//!
//! A [`Connector`] opens physical connections; a [`Connection`] is one of them.
//! Pools only ever talk to these two traits, so the bounded and unbounded
//! strategies work the same against PostgreSQL and the in-memory store.

mod memory;
mod postgres;

use std::any::Any;

use async_trait::async_trait;

use crate::error::DbResult;

pub use memory::{MemoryConnection, MemoryConnector, MemoryStore};
pub use postgres::{PgConnector, PgSessionConnection};

/// Opens physical connections to a data store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a fresh physical connection
    async fn connect(&self) -> DbResult<Box<dyn Connection>>;

    /// Target description for logs (never contains credentials)
    fn describe(&self) -> String;
}

/// One physical connection.
///
/// Transaction control is explicit; nothing here commits implicitly.
#[async_trait]
pub trait Connection: Any + Send {
    async fn begin(&mut self) -> DbResult<()>;

    async fn commit(&mut self) -> DbResult<()>;

    async fn rollback(&mut self) -> DbResult<()>;

    /// Round-trip to the store to check the connection is still usable
    async fn ping(&mut self) -> DbResult<()>;

    /// Gracefully terminate the connection
    async fn close(self: Box<Self>) -> DbResult<()>;

    /// Typed access for callers that know the backend
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
