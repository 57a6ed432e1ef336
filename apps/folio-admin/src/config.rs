//! Admin CLI configuration.
//!
//! Every setting is a flag with an environment fallback:
//!
//! ```bash
//! DATABASE_URL=sqlite:///var/lib/folio/folio.db  # default: ~/.folio/folio.db
//! FOLIO_MAX_CONNECTIONS=5
//! FOLIO_BUSY_TIMEOUT_MS=5000
//! ```

use std::time::Duration;

use folio_store_sqlite::{SqliteConfig, SqliteStore};
use folio_storage::StoreError;
use thiserror::Error;

/// Validated admin configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    /// None means the per-user default database.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported database URL: {0}. Expected a sqlite: URL")]
    UnsupportedUrl(String),

    #[error("FOLIO_MAX_CONNECTIONS must be at least 1")]
    NoConnections,

    #[error("FOLIO_BUSY_TIMEOUT_MS must be at least 1")]
    NoBusyTimeout,

    #[error("Cannot locate default database: {0}")]
    DefaultLocation(StoreError),
}

impl AdminConfig {
    pub fn new(
        database_url: Option<String>,
        max_connections: u32,
        busy_timeout_ms: u64,
    ) -> Result<Self, ConfigError> {
        let database_url = database_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &database_url {
            if !url.starts_with("sqlite:") {
                return Err(ConfigError::UnsupportedUrl(url.clone()));
            }
        }
        if max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }
        if busy_timeout_ms == 0 {
            return Err(ConfigError::NoBusyTimeout);
        }
        Ok(Self {
            database_url,
            max_connections,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }

    /// Pool settings, resolving the default database location when no URL was given.
    pub fn sqlite_config(&self) -> Result<SqliteConfig, ConfigError> {
        let url = match &self.database_url {
            Some(url) => url.clone(),
            None => SqliteStore::default_url().map_err(ConfigError::DefaultLocation)?,
        };
        Ok(SqliteConfig {
            url,
            max_connections: self.max_connections,
            busy_timeout: self.busy_timeout,
        })
    }

    pub async fn open_store(&self) -> Result<SqliteStore, Box<dyn std::error::Error>> {
        let config = self.sqlite_config()?;
        tracing::debug!(url = %config.url, "opening database");
        Ok(SqliteStore::open_with(&config).await?)
    }
}
