use sqlx::PgPool;
use thiserror::Error;

/// Migration error types
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Failed(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Applies the embedded schema migrations
pub struct MigrationManager {
    pool: PgPool,
}

impl MigrationManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations in version order
    pub async fn run_migrations(&self) -> Result<(), MigrationError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Status of every embedded migration
    pub async fn check_status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        let migrator = sqlx::migrate!("./migrations");

        // The tracking table does not exist before the first run
        let applied: Vec<(i64,)> =
            sqlx::query_as("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
                .fetch_all(&self.pool)
                .await
                .unwrap_or_default();
        let applied: std::collections::HashSet<i64> = applied.into_iter().map(|(v,)| v).collect();

        Ok(migrator
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                description: m.description.to_string(),
                applied: applied.contains(&m.version),
            })
            .collect())
    }

    pub async fn has_pending_migrations(&self) -> Result<bool, MigrationError> {
        Ok(self.check_status().await?.iter().any(|s| !s.applied))
    }
}
