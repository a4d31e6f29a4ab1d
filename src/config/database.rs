use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record store configuration managed by Figment.
///
/// All timeouts are in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection string for the record store (required, non-empty).
    /// Env: `DATABASE_URL`. TOML: `database.url`. Example: `sqlite://pages.db`.
    #[serde(default)]
    pub url: String,

    /// Deadline for a single connect call.
    /// TOML: `database.connect_timeout_ms`. Default: `4000`.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Total connect attempts before giving up.
    /// TOML: `database.connect_attempts`. Default: `3`.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: usize,

    /// Fixed delay between connect attempts.
    /// TOML: `database.retry_delay_ms`. Default: `2000`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Deadline for the liveness ping run before reusing a cached connection.
    /// TOML: `database.reuse_check_timeout_ms`. Default: `1500`.
    #[serde(default = "default_reuse_check_timeout_ms")]
    pub reuse_check_timeout_ms: u64,

    /// Deadline for `/health`. Also caps the post-connect verification ping,
    /// which never outlives the connect timeout.
    /// TOML: `database.health_check_timeout_ms`. Default: `2000`.
    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,

    /// Budget for insert/delete.
    /// TOML: `database.write_budget_ms`. Default: `6000`.
    #[serde(default = "default_write_budget_ms")]
    pub write_budget_ms: u64,

    /// Budget for list queries.
    /// TOML: `database.read_budget_ms`. Default: `4000`.
    #[serde(default = "default_read_budget_ms")]
    pub read_budget_ms: u64,

    /// Budget for lookups by id.
    /// TOML: `database.lookup_budget_ms`. Default: `3000`.
    #[serde(default = "default_lookup_budget_ms")]
    pub lookup_budget_ms: u64,

    /// Upper bound on the number of pages a list query returns.
    /// TOML: `database.list_limit`. Default: `100`.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
}

/// Connect, retry and health-check timings used by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionPolicy {
    pub connect_timeout: Duration,
    pub connect_attempts: usize,
    pub retry_delay: Duration,
    pub reuse_check_timeout: Duration,
    pub health_check_timeout: Duration,
}

impl ConnectionPolicy {
    /// Worst-case wall clock for one connect flight that ends in failure.
    pub fn exhaustion_bound(&self) -> Duration {
        let attempts = u32::try_from(self.connect_attempts.max(1)).unwrap_or(u32::MAX);
        (self.connect_timeout + self.retry_delay) * attempts
    }
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        DatabaseConfig::default().connection_policy()
    }
}

/// Per-operation wall-clock budgets for the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreBudgets {
    pub write: Duration,
    pub read: Duration,
    pub lookup: Duration,
    pub list_limit: u32,
}

impl Default for StoreBudgets {
    fn default() -> Self {
        DatabaseConfig::default().store_budgets()
    }
}

impl DatabaseConfig {
    pub fn connection_policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            connect_attempts: self.connect_attempts.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            reuse_check_timeout: Duration::from_millis(self.reuse_check_timeout_ms),
            health_check_timeout: Duration::from_millis(self.health_check_timeout_ms),
        }
    }

    pub fn store_budgets(&self) -> StoreBudgets {
        StoreBudgets {
            write: Duration::from_millis(self.write_budget_ms),
            read: Duration::from_millis(self.read_budget_ms),
            lookup: Duration::from_millis(self.lookup_budget_ms),
            list_limit: self.list_limit.max(1),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            // No default. `Config::validate()` enforces non-empty.
            url: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            connect_attempts: default_connect_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            reuse_check_timeout_ms: default_reuse_check_timeout_ms(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            write_budget_ms: default_write_budget_ms(),
            read_budget_ms: default_read_budget_ms(),
            lookup_budget_ms: default_lookup_budget_ms(),
            list_limit: default_list_limit(),
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    4000
}

fn default_connect_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_reuse_check_timeout_ms() -> u64 {
    1500
}

fn default_health_check_timeout_ms() -> u64 {
    2000
}

fn default_write_budget_ms() -> u64 {
    6000
}

fn default_read_budget_ms() -> u64 {
    4000
}

fn default_lookup_budget_ms() -> u64 {
    3000
}

fn default_list_limit() -> u32 {
    100
}
