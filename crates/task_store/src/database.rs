//! SQLite connection handle shared by the storage components.

use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{StoreConfig, TaskStoreError, TaskStoreResult};

/// Path that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Database connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Opens (creating if missing) the database file at `path`.
    pub async fn open(path: &Path, max_connections: u32) -> TaskStoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    tracing::error!(path = %parent.display(), error = %e, "Failed to create database directory");
                    TaskStoreError::storage(
                        "create database directory",
                        Some(&parent.display().to_string()),
                        sqlx::Error::Io(e),
                    )
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| TaskStoreError::storage("open database", None, e))?;

        tracing::info!(path = %path.display(), "Database connected");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    ///
    /// Every call gets its own uniquely named shared-cache database, so
    /// parallel tests never see each other's tables.
    pub async fn in_memory() -> TaskStoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| TaskStoreError::storage("open database", None, e))?;

        // A single connection keeps the memory database alive for the pool's lifetime.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| TaskStoreError::storage("open database", None, e))?;

        tracing::debug!("In-memory database opened");
        Ok(Self { pool })
    }

    /// Opens the database described by `config`.
    pub async fn from_config(config: &StoreConfig) -> TaskStoreResult<Self> {
        if config.database_path.as_os_str() == MEMORY_PATH {
            Self::in_memory().await
        } else {
            Self::open(&config.database_path, config.max_connections).await
        }
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks the schema catalog for a table.
    pub async fn table_exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Closes every connection. Later operations fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database closed");
    }

    /// Returns true once [`Database::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
