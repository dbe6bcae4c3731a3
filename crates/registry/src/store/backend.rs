//! Pooled SQLite store.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

use super::schema;

/// SQLite-backed registry store.
///
/// Each core operation ([`resolve`](SqliteStore::resolve),
/// [`search_persons`](SqliteStore::search_persons),
/// [`register_patient`](SqliteStore::register_patient)) takes one pooled
/// connection for its duration; the connection returns to the pool on every
/// exit path, including errors.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteStoreConfig,
    is_memory: bool,
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool checkout timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable WAL mode for file-backed databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,
}

fn default_max_connections() -> u32 {
    4
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
        }
    }
}

impl SqliteStoreConfig {
    /// Reads configuration from `REGISTRY_DB_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            max_connections: env_or("REGISTRY_DB_MAX_CONNECTIONS", default_max_connections()),
            min_connections: env_or("REGISTRY_DB_MIN_CONNECTIONS", default_min_connections()),
            connection_timeout_ms: env_or(
                "REGISTRY_DB_CONNECTION_TIMEOUT_MS",
                default_connection_timeout_ms(),
            ),
            busy_timeout_ms: env_or("REGISTRY_DB_BUSY_TIMEOUT_MS", default_busy_timeout_ms()),
            enable_wal: env_or("REGISTRY_DB_ENABLE_WAL", true),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl SqliteStore {
    /// Creates an in-memory store.
    ///
    /// Every `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection.
    pub fn in_memory() -> StoreResult<Self> {
        let config = SqliteStoreConfig {
            max_connections: 1,
            min_connections: 1,
            ..SqliteStoreConfig::default()
        };
        Self::build(SqliteConnectionManager::memory(), config, true)
    }

    /// Opens or creates a file-backed store with default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_config(path, SqliteStoreConfig::default())
    }

    /// Opens or creates a file-backed store with custom configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: SqliteStoreConfig) -> StoreResult<Self> {
        Self::build(SqliteConnectionManager::file(path.as_ref()), config, false)
    }

    /// Opens the store described by `REGISTRY_DB_PATH` and the other
    /// `REGISTRY_DB_*` variables.
    pub fn from_env() -> StoreResult<Self> {
        let path = std::env::var("REGISTRY_DB_PATH").map_err(|_| StoreError::ConnectionFailed {
            message: "REGISTRY_DB_PATH is not set".to_string(),
        })?;
        Self::with_config(path, SqliteStoreConfig::from_env())
    }

    fn build(
        manager: SqliteConnectionManager,
        config: SqliteStoreConfig,
        is_memory: bool,
    ) -> StoreResult<Self> {
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let wal = config.enable_wal && !is_memory;

        // Per-connection settings; the patient -> person reference relies on
        // foreign keys being enforced.
        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            if wal {
                let _mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            }
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| StoreError::ConnectionFailed {
                message: e.to_string(),
            })?;

        tracing::info!(
            is_memory,
            max_connections = config.max_connections,
            "sqlite store ready"
        );

        Ok(Self {
            pool,
            config,
            is_memory,
        })
    }

    /// Creates the schema when missing. Safe to call repeatedly.
    pub fn init_schema(&self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    /// Checks out a connection from the pool.
    pub(crate) fn get_connection(
        &self,
    ) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Whether this store lives in memory.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// The store configuration.
    pub fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SqliteStoreConfig::default();
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 1);
        assert!(config.enable_wal);
    }

    #[test]
    fn in_memory_store_pins_one_connection() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_memory());
        assert_eq!(store.config().max_connections, 1);
    }

    #[test]
    fn init_schema_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = SqliteStore::in_memory().unwrap();
        store.init_schema().unwrap();

        let conn = store.get_connection().unwrap();
        let result = conn.execute(
            "INSERT INTO patient (person_id, sex, birth_date, race, weight_kg)
             VALUES (randomblob(16), 'F', '1990-04-12', 'PARDO', 70.0)",
            [],
        );
        assert!(result.is_err(), "orphan patient row must be rejected");
    }
}
