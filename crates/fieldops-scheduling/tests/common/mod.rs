//! Shared fixtures for scheduling integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use fieldops_core::clock::FixedClock;
use fieldops_core::models::{Booking, BookingId, TechnicianId};
use fieldops_core::service_day::local_to_utc;
use fieldops_core::SchedulingPolicy;
use fieldops_geo::{normalize, ProviderError, RouteEstimate, RoutingProvider};
use fieldops_scheduling::{
    AvailabilityEngine, CacheKeyScheme, EstimatorConfig, InsightAnalyzer, RouteEstimator,
    TravelPairCache,
};
use fieldops_store::memory::{
    MemoryBookingStore, MemoryInsightStore, MemoryRunLogStore, MemoryTravelCacheStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TZ: Tz = chrono_tz::America::Toronto;

/// Routing provider answering from a fixed table of minutes, counting calls
///
/// Pairs missing from the table fail with `NoRoute`.
#[derive(Default)]
pub struct TableProvider {
    minutes: Mutex<HashMap<(String, String), f64>>,
    calls: AtomicUsize,
}

impl TableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drive time in both directions
    pub fn with_route(self, a: &str, b: &str, minutes: f64) -> Self {
        {
            let mut table = self.minutes.lock().unwrap();
            table.insert((normalize(a), normalize(b)), minutes);
            table.insert((normalize(b), normalize(a)), minutes);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for TableProvider {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        _departure: Option<DateTime<Utc>>,
    ) -> Result<RouteEstimate, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let table = self.minutes.lock().unwrap();
        match table.get(&(normalize(origin), normalize(destination))) {
            Some(minutes) => Ok(RouteEstimate {
                duration_seconds: minutes * 60.0,
                distance_meters: minutes * 1000.0,
                polyline: None,
            }),
            None => Err(ProviderError::NoRoute("ZERO_RESULTS".to_string())),
        }
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// A fully wired engine over in-memory stores
pub struct Harness {
    pub bookings: Arc<MemoryBookingStore>,
    pub travel: Arc<MemoryTravelCacheStore>,
    pub insights: Arc<MemoryInsightStore>,
    pub run_logs: Arc<MemoryRunLogStore>,
    pub provider: Arc<TableProvider>,
    pub cache: Arc<TravelPairCache>,
    pub estimator: Arc<RouteEstimator>,
    pub clock: Arc<FixedClock>,
    pub policy: SchedulingPolicy,
}

impl Harness {
    pub fn new(provider: TableProvider, policy: SchedulingPolicy) -> Self {
        Self::at(provider, policy, default_now())
    }

    pub fn at(provider: TableProvider, policy: SchedulingPolicy, now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock(now));
        let travel = Arc::new(MemoryTravelCacheStore::new());
        let provider = Arc::new(provider);
        let cache = Arc::new(TravelPairCache::new(
            travel.clone(),
            clock.clone(),
            CacheKeyScheme::from_policy(&policy),
            90,
        ));
        let estimator = Arc::new(RouteEstimator::new(
            provider.clone(),
            cache.clone(),
            clock.clone(),
            EstimatorConfig::default(),
        ));

        Self {
            bookings: Arc::new(MemoryBookingStore::new()),
            travel,
            insights: Arc::new(MemoryInsightStore::new()),
            run_logs: Arc::new(MemoryRunLogStore::new()),
            provider,
            cache,
            estimator,
            clock,
            policy,
        }
    }

    pub fn availability(&self) -> AvailabilityEngine {
        AvailabilityEngine::new(
            self.bookings.clone(),
            self.estimator.clone(),
            self.policy.clone(),
            self.clock.clone(),
        )
    }

    pub fn analyzer(&self) -> InsightAnalyzer {
        InsightAnalyzer::new(
            self.bookings.clone(),
            self.insights.clone(),
            self.run_logs.clone(),
            self.estimator.clone(),
            self.policy.clone(),
            self.clock.clone(),
        )
    }
}

/// Sunday 2026-03-01, noon UTC
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Business-local wall clock on a March 2026 day
pub fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    local_to_utc(date(day), time(hour, minute), TZ)
}

pub fn booking(id: &str, tech: &str, start: DateTime<Utc>, hours: f64, location: &str) -> Booking {
    Booking {
        id: BookingId::from(id),
        technician_ids: vec![TechnicianId::from(tech)],
        start,
        duration_hours: hours,
        actual_duration_hours: None,
        historical_duration_hours: None,
        location: location.to_string(),
    }
}
