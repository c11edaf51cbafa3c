//! PostgreSQL backend on top of `sqlx::PgConnection`

use std::any::Any;
use std::str::FromStr;

use async_trait::async_trait;
use dbsession_common::redact_url;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection as _, Executor as _};

use super::{Connection, Connector};
use crate::error::{DbError, DbResult};

/// Opens `PgConnection`s from options parsed once at construction.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    target: String,
}

impl PgConnector {
    /// Parse a PostgreSQL URL.
    ///
    /// Accepts `postgres://`, `postgresql://` and driver-qualified schemes
    /// such as `postgresql+asyncpg://`. No network I/O happens here.
    pub fn from_url(url: &str, echo: bool) -> DbResult<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| DbError::configuration("connection URL has no scheme"))?;

        let base = scheme.split('+').next().unwrap_or(scheme);
        if base != "postgres" && base != "postgresql" {
            return Err(DbError::configuration(format!(
                "not a PostgreSQL URL: {scheme}://"
            )));
        }

        let normalized = format!("postgres://{rest}");
        let mut options = PgConnectOptions::from_str(&normalized).map_err(|e| {
            DbError::configuration(format!("invalid PostgreSQL URL {}: {e}", redact_url(url)))
        })?;

        if !echo {
            options = options.disable_statement_logging();
        }

        Ok(Self {
            options,
            target: redact_url(url),
        })
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> DbResult<Box<dyn Connection>> {
        let conn = self.options.connect().await.map_err(|e| match DbError::from(e) {
            // Anything that prevents the handshake means the store is unreachable
            DbError::Database(msg) => DbError::Connection(msg),
            other => other,
        })?;

        Ok(Box::new(PgSessionConnection { conn }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// A physical PostgreSQL connection handed out through a session.
///
/// Use [`PgSessionConnection::as_pg`] to run `sqlx` queries inside the
/// session's transaction.
#[derive(Debug)]
pub struct PgSessionConnection {
    conn: PgConnection,
}

impl PgSessionConnection {
    /// Borrow the underlying `sqlx` connection as an executor
    pub fn as_pg(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

#[async_trait]
impl Connection for PgSessionConnection {
    async fn begin(&mut self) -> DbResult<()> {
        self.conn.execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.conn.execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.conn.execute("ROLLBACK").await?;
        Ok(())
    }

    async fn ping(&mut self) -> DbResult<()> {
        self.conn.ping().await.map_err(DbError::connection)
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.conn.close().await.map_err(DbError::connection)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
