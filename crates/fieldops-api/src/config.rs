use std::env;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: Option<String>,

    /// Path of the optional TOML file with scheduling settings
    pub config_file: String,

    pub routing_api_key: Option<String>,
    pub enhancer: Option<EnhancerEndpoint>,
}

/// Chat-completions endpoint used by the insight enhancer
#[derive(Debug, Clone)]
pub struct EnhancerEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("FIELDOPS_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3001);

        let cors_origin =
            env::var("FIELDOPS_CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let database_url = non_empty_var("DATABASE_URL");

        let config_file =
            env::var("FIELDOPS_CONFIG").unwrap_or_else(|_| "fieldops.toml".to_string());

        let routing_api_key = non_empty_var("FIELDOPS_ROUTING_API_KEY");

        // Both the endpoint and its key are needed
        let enhancer = match (non_empty_var("FIELDOPS_ENHANCER_URL"), non_empty_var("FIELDOPS_ENHANCER_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(EnhancerEndpoint { base_url, api_key }),
            _ => None,
        };

        Self {
            port,
            cors_origin,
            database_url,
            config_file,
            routing_api_key,
            enhancer,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if PostgreSQL storage is configured
    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
