use chrono::{DateTime, Utc};
use serde::Serialize;

/// One live, verified connection owned by the connection manager.
///
/// Callers receive clones to pass into store operations; the manager replaces
/// the cached handle wholesale and never mutates it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle<T> {
    conn: T,
    created_at: DateTime<Utc>,
    attempts: usize,
    generation: u64,
}

impl<T> ConnectionHandle<T> {
    pub(super) fn new(conn: T, attempts: usize, generation: u64) -> Self {
        Self {
            conn,
            created_at: Utc::now(),
            attempts,
            generation,
        }
    }

    pub fn conn(&self) -> &T {
        &self.conn
    }

    pub fn into_conn(self) -> T {
        self.conn
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Connect attempts the flight that produced this handle needed.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Starts at 1 and increases with every successful (re)connect.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
    /// The last flight exhausted its attempts; the next checkout starts over.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSnapshot {
    pub state: ConnectionState,
    /// Generation of the cached handle, 0 when none has ever been created.
    pub generation: u64,
    /// Connect flights started since the manager was spawned.
    pub flights_started: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_since: Option<DateTime<Utc>>,
}

/// Result of a health probe. Always produced, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub connected: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
