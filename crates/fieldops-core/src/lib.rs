//! Fieldops Core - Domain models, policy, and configuration
//!
//! This crate contains the scheduling domain types shared by every other
//! crate: bookings, travel estimates, schedule insights, the service-day
//! ordering rule, fingerprint hashing, and layered configuration.

pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod policy;
pub mod service_day;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{FieldopsError, Result};
pub use policy::{InsightThresholds, SchedulingPolicy};
pub use service_day::{service_day_ordering_key, ServiceDayKey};
