use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash key of a travel-pair cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(pub String);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse departure bucket: weekday and hour bucket in the business time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Days from Monday (0 = Monday, 6 = Sunday)
    pub weekday: u8,

    /// Index of the hour bucket within the day
    pub hour_bucket: u8,
}

/// A point-to-point travel query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPair {
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
}

impl TravelPair {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure: DateTime<Utc>,
    ) -> Self {
        Self { origin: origin.into(), destination: destination.into(), departure }
    }
}

/// Travel duration and distance for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    /// Typical driving time in minutes
    pub duration_minutes: f64,

    /// Estimated driving distance in kilometres
    pub distance_km: f64,

    /// Encoded route polyline, when the provider returns one
    #[serde(default)]
    pub polyline: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl TravelEstimate {
    pub fn new(duration_minutes: f64, distance_km: f64) -> Self {
        Self { duration_minutes, distance_km, polyline: None, notes: None }
    }

    /// Estimate for a pair whose endpoints are the same place
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Persisted travel-pair cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelCacheEntry {
    pub key: CacheKey,
    pub origin_normalized: String,
    pub destination_normalized: String,
    pub time_bucket: TimeBucket,
    pub estimate: TravelEstimate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TravelCacheEntry {
    /// Whether the entry has outlived its TTL
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Aggregate travel for one technician-day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayTravelSummary {
    /// Number of travel legs on the route
    pub segment_count: usize,

    /// Sum of known leg durations
    pub total_minutes: f64,

    /// Sum of known leg distances
    pub total_km: f64,

    /// Legs with no known estimate
    pub missing_estimates: usize,
}

impl DayTravelSummary {
    /// Whether every leg on the route has an estimate
    pub fn is_complete(&self) -> bool {
        self.missing_estimates == 0
    }
}
