//! PostgreSQL storage adapter implementation

pub mod bookings;
pub mod config;
pub mod insights;
pub mod migrations;
pub mod run_logs;
pub mod travel_cache;

pub use config::{ConfigError, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use fieldops_core::error::{FieldopsError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL storage adapter
///
/// One pool backs every store port, so a single `Arc<PostgresStore>` can be
/// handed to the engine as booking store, travel cache, insight store, and
/// run log at once.
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given configuration
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| FieldopsError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| FieldopsError::Storage(format!("Failed to connect to database: {}", e)))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| FieldopsError::Storage(format!("Connection test failed: {}", e)))?;

        tracing::info!(max_connections = config.pool.max_connections, "Connected to PostgreSQL");

        Ok(Self { pool, config })
    }

    /// Create a new PostgreSQL store and run migrations when configured to
    pub async fn with_migrations(config: PostgresConfig) -> Result<Self> {
        let auto_migrate = config.auto_migrate;
        let store = Self::new(config).await?;
        if auto_migrate {
            store.run_migrations().await?;
        }
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| FieldopsError::Storage(format!("Migration failed: {}", e)))
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        MigrationManager::new(self.pool.clone())
            .check_status()
            .await
            .map_err(|e| FieldopsError::Storage(format!("Failed to check migration status: {}", e)))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FieldopsError::Storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

/// Map a database error into the storage error variant with context
pub(crate) fn db_err(context: &str) -> impl Fn(sqlx::Error) -> FieldopsError + '_ {
    move |e| FieldopsError::Storage(format!("{}: {}", context, e))
}
