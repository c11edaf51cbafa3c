//! Connection pool factory
//!
//! Turns a [`DatabaseConfig`] and a [`PoolStrategy`] into a ready
//! [`ConnectionPool`]. All URL problems surface here, not on first use.

use std::sync::Arc;

use dbsession_common::{redact_url, DatabaseConfig};

use super::strategy::PoolStrategy;
use super::ConnectionPool;
use crate::connection::{Connector, MemoryConnector, MemoryStore, PgConnector};
use crate::error::{DbError, DbResult};

/// Resolve the connector for a config's URL scheme
pub fn connector_for(config: &DatabaseConfig) -> DbResult<Arc<dyn Connector>> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(DbError::configuration("DATABASE_URL is empty"));
    }

    let (scheme, rest) = url.split_once("://").ok_or_else(|| {
        DbError::configuration(format!("connection URL has no scheme: {}", redact_url(url)))
    })?;

    match scheme.split('+').next().unwrap_or(scheme) {
        "postgres" | "postgresql" => Ok(Arc::new(PgConnector::from_url(url, config.echo)?)),
        "memory" => {
            let name = if rest.is_empty() { "default" } else { rest };
            Ok(Arc::new(MemoryConnector::named(name, MemoryStore::new())))
        }
        other => Err(DbError::configuration(format!(
            "unsupported database scheme: {other}"
        ))),
    }
}

/// Build a pool for `config` using the given strategy
pub fn build_pool(config: &DatabaseConfig, strategy: PoolStrategy) -> DbResult<ConnectionPool> {
    let connector = connector_for(config)?;
    build_pool_with_connector(connector, strategy)
}

/// Build a pool around an existing connector
pub fn build_pool_with_connector(
    connector: Arc<dyn Connector>,
    strategy: PoolStrategy,
) -> DbResult<ConnectionPool> {
    strategy.validate()?;

    let store = connector.describe();
    let pool = ConnectionPool::new(connector, strategy);

    tracing::info!(store = %store, strategy = %strategy, "Connection pool created");

    Ok(pool)
}
