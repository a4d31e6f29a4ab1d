mod basic;
mod database;
mod generation;

pub use basic::BasicConfig;
pub use database::{ConnectionPolicy, DatabaseConfig, StoreBudgets};
pub use generation::GeneratorConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Record store connection and timeout settings (see `database` table).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Generation service settings (see `generation` table).
    #[serde(default)]
    pub generation: GeneratorConfig,
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] figment::Error),

    #[error("DATABASE_URL (database.url) must be set and non-empty")]
    MissingDatabaseUrl,

    #[error("GEMINI_API_KEY (generation.api_key) must be set and non-empty")]
    MissingApiKey,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "FORGE_";

impl Config {
    /// Defaults, then `config.toml` if present, then `FORGE_*` variables
    /// (`__` separates tables), then `DATABASE_URL` and `GEMINI_API_KEY`.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "generation.api_key".into()),
            )
    }

    /// Loads configuration from every source and validates required fields.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.generation.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn connection_policy(&self) -> ConnectionPolicy {
        self.database.connection_policy()
    }

    pub fn store_budgets(&self) -> StoreBudgets {
        self.database.store_budgets()
    }
}
