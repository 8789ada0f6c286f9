//! PostgreSQL configuration

use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// PostgreSQL connection and behavior configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Connection pool configuration
    pub pool: PoolConfig,
    /// Whether to apply pending migrations on connect
    pub auto_migrate: bool,
}

impl PostgresConfig {
    /// Load configuration from environment variables
    ///
    /// Requires DATABASE_URL. `FIELDOPS_DB_MAX_CONNECTIONS` and
    /// `FIELDOPS_DB_AUTO_MIGRATE` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let mut config = Self::from_database_url(database_url, "DATABASE_URL")?;

        if let Ok(value) = std::env::var("FIELDOPS_DB_MAX_CONNECTIONS") {
            config.pool.max_connections = value.parse().map_err(|_| ConfigError::Invalid {
                key: "FIELDOPS_DB_MAX_CONNECTIONS".to_string(),
                reason: format!("'{}' is not a number", value),
            })?;
        }

        if let Ok(value) = std::env::var("FIELDOPS_DB_AUTO_MIGRATE") {
            config.auto_migrate = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Create a new configuration with the given database URL
    pub fn new(database_url: String) -> Result<Self, ConfigError> {
        Self::from_database_url(database_url, "database_url")
    }

    fn from_database_url(database_url: String, key: &str) -> Result<Self, ConfigError> {
        if database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(Self { database_url, pool: PoolConfig::default(), auto_migrate: true })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        self.pool.validate()
    }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum number of connections allowed
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool
    pub acquire_timeout: Duration,
    /// Timeout for idle connections before they are closed
    pub idle_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) cannot be greater than max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}
