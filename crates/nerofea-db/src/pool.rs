//! PostgreSQL connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use nerofea_core::{defaults, Error, Result};

/// Pool sizing and timeout knobs, overridable from the environment.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// How long `acquire` waits for a free connection.
    pub acquire_timeout: Duration,
    /// Idle connections are closed after this long.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: defaults::DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(defaults::DB_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(defaults::DB_IDLE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Build a config from `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS`, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DATABASE_MAX_CONNECTIONS").ok(),
            std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS").ok(),
        )
    }

    fn from_vars(max_connections: Option<String>, acquire_timeout_secs: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(n) = max_connections.and_then(|v| v.parse::<u32>().ok()) {
            config.max_connections = n.max(1);
        }
        if let Some(secs) = acquire_timeout_secs.and_then(|v| v.parse::<u64>().ok()) {
            config.acquire_timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Connect a pool using environment-derived configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::from_env()).await
}

/// Connect a pool with an explicit configuration.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        max_connections = config.max_connections,
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}
