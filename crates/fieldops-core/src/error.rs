//! Error types for Fieldops

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldopsError {
    // Input validation errors
    #[error("Invalid date range: {reason}")]
    InvalidDateRange { reason: String },

    #[error("Invalid request field {field}: {reason}")]
    InvalidRequest { field: String, reason: String },

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    // Insight errors
    #[error("Insight not found: {id}")]
    InsightNotFound { id: String },

    #[error("Insight {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FieldopsError {
    /// Whether the error was caused by caller input rather than the system
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FieldopsError::InvalidDateRange { .. }
                | FieldopsError::InvalidRequest { .. }
                | FieldopsError::InvalidAddress { .. }
        )
    }
}

impl From<serde_json::Error> for FieldopsError {
    fn from(err: serde_json::Error) -> Self {
        FieldopsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FieldopsError>;
