//! Provider health tracking
//!
//! Credential and billing failures disable the provider for the life of the
//! process. Rate limiting starts a cooldown during which calls are skipped.

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Default cooldown after a 429
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 5;

/// Provider error codes that mean the account cannot be used
const FATAL_ERROR_CODES: &[&str] = &[
    "invalid_api_key",
    "insufficient_quota",
    "billing_hard_limit_reached",
    "account_deactivated",
];

/// Observable health of the provider
#[derive(Debug, Clone, PartialEq)]
pub enum HealthState {
    Healthy,
    CoolingDown { until: DateTime<Utc> },
    Disabled { reason: String },
}

#[derive(Debug, Default)]
struct Inner {
    disabled: Option<String>,
    cooldown_until: Option<DateTime<Utc>>,
}

/// Shared health record for one enhancement provider
#[derive(Debug)]
pub struct ProviderHealth {
    cooldown: Duration,
    inner: RwLock<Inner>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_COOLDOWN_MINUTES))
    }
}

impl ProviderHealth {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, inner: RwLock::new(Inner::default()) }
    }

    /// Current state as seen at `now`
    pub fn state(&self, now: DateTime<Utc>) -> HealthState {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = &inner.disabled {
            return HealthState::Disabled { reason: reason.clone() };
        }
        match inner.cooldown_until {
            Some(until) if until > now => HealthState::CoolingDown { until },
            _ => HealthState::Healthy,
        }
    }

    /// Whether a call may be attempted at `now`
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == HealthState::Healthy
    }

    /// Disable the provider until the process restarts
    pub fn disable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(reason = %reason, "Insight enhancer disabled");
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.disabled.get_or_insert(reason);
    }

    /// Start a cooldown window from `now`
    pub fn start_cooldown(&self, now: DateTime<Utc>) {
        let until = now + self.cooldown;
        tracing::warn!(until = %until, "Insight enhancer rate limited; cooling down");
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.cooldown_until = Some(until);
    }

    /// Record a failed HTTP exchange and update state accordingly
    ///
    /// `error_code` is the provider's machine-readable error code, if any.
    pub fn record_failure(&self, status: u16, error_code: Option<&str>, now: DateTime<Utc>) {
        let fatal_code = error_code.filter(|code| FATAL_ERROR_CODES.contains(code));
        match (status, fatal_code) {
            (_, Some(code)) => self.disable(format!("provider error code {}", code)),
            (401 | 402 | 403, None) => self.disable(format!("provider returned {}", status)),
            (429, None) => self.start_cooldown(now),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_health_is_available() {
        assert!(ProviderHealth::default().is_available(now()));
    }

    #[test]
    fn test_auth_failure_disables_permanently() {
        let health = ProviderHealth::default();
        health.record_failure(401, None, now());
        assert!(!health.is_available(now() + Duration::days(30)));
        assert!(matches!(health.state(now()), HealthState::Disabled { .. }));
    }

    #[test]
    fn test_rate_limit_cools_down() {
        let health = ProviderHealth::default();
        health.record_failure(429, None, now());
        assert!(!health.is_available(now() + Duration::minutes(4)));
        assert!(health.is_available(now() + Duration::minutes(5)));
    }

    #[test]
    fn test_quota_code_on_429_disables() {
        let health = ProviderHealth::default();
        health.record_failure(429, Some("insufficient_quota"), now());
        assert!(matches!(health.state(now() + Duration::hours(1)), HealthState::Disabled { .. }));
    }

    #[test]
    fn test_server_error_leaves_health_alone() {
        let health = ProviderHealth::default();
        health.record_failure(500, None, now());
        assert!(health.is_available(now()));
    }
}
