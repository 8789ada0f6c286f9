//! Enhancer port definitions

use async_trait::async_trait;
use fieldops_core::models::InsightDraft;
use thiserror::Error;

/// Failure talking to the enhancement provider
///
/// Never escapes an enhancer; callers always get drafts back.
#[derive(Debug, Error)]
pub enum EnhancerError {
    #[error("Enhancer disabled: {0}")]
    Disabled(String),

    #[error("Enhancer cooling down after rate limiting")]
    CoolingDown,

    #[error("Enhancer request failed: {0}")]
    Transport(String),

    #[error("Enhancer request timed out")]
    Timeout,

    #[error("Enhancer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed enhancer response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for EnhancerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EnhancerError::Timeout
        } else if err.is_decode() {
            EnhancerError::Malformed(err.to_string())
        } else {
            EnhancerError::Transport(err.to_string())
        }
    }
}

/// Port for refining the wording of insight drafts
///
/// Implementations must preserve each draft's identity (kind, severity,
/// fingerprint, linked bookings) and may only change title, message, and
/// confidence. On any failure the input drafts are returned unchanged.
#[async_trait]
pub trait InsightEnhancer: Send + Sync {
    async fn enhance(&self, drafts: Vec<InsightDraft>) -> Vec<InsightDraft>;

    /// Enhancer name for logs
    fn name(&self) -> &str;
}

/// Enhancer that returns drafts untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnhancer;

#[async_trait]
impl InsightEnhancer for NoopEnhancer {
    async fn enhance(&self, drafts: Vec<InsightDraft>) -> Vec<InsightDraft> {
        drafts
    }

    fn name(&self) -> &str {
        "noop"
    }
}
