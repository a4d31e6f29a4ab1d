//! Transport seam of the connection manager.
//!
//! The manager only knows how to open, ping and close a connection; the SQL
//! lives in the store. Tests plug in fake connectors here.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::fmt::Debug;
use std::{str::FromStr, time::Duration};
use tracing::debug;

use super::schema::SQLITE_INIT;
use crate::error::TransportError;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Live transport handle handed to store operations.
    type Conn: Clone + Debug + Send + Sync + 'static;

    /// Opens a brand new connection. Called only by the manager's connect flight.
    async fn connect(&self) -> Result<Self::Conn, TransportError>;

    /// Lightweight liveness command.
    async fn ping(&self, conn: &Self::Conn) -> Result<(), TransportError>;

    /// Releases a connection that is being replaced or discarded.
    async fn close(&self, _conn: Self::Conn) {}
}

/// SQLite connector: each connection is a pool capped at one connection.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    options: SqliteConnectOptions,
    acquire_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(database_url: &str, acquire_timeout: Duration) -> Result<Self, TransportError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| TransportError::InvalidTarget(e.to_string()))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        Ok(Self {
            options,
            acquire_timeout,
        })
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Conn = SqlitePool;

    async fn connect(&self) -> Result<SqlitePool, TransportError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(self.options.clone())
            .await?;

        apply_schema(&pool).await?;
        debug!("SQLite pool opened and schema applied");
        Ok(pool)
    }

    async fn ping(&self, conn: &SqlitePool) -> Result<(), TransportError> {
        sqlx::query("SELECT 1").execute(conn).await?;
        Ok(())
    }

    async fn close(&self, conn: SqlitePool) {
        conn.close().await;
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
