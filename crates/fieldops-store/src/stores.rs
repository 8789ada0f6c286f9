//! Bundle of the four storage ports backing one deployment

use std::sync::Arc;

use crate::memory::{MemoryBookingStore, MemoryInsightStore, MemoryRunLogStore, MemoryTravelCacheStore};
use crate::ports::{BookingStore, InsightStore, RunLogStore, TravelCacheStore};
use crate::postgres::PostgresStore;

/// Storage ports for one backend
#[derive(Clone)]
pub struct Stores {
    pub bookings: Arc<dyn BookingStore>,
    pub travel_cache: Arc<dyn TravelCacheStore>,
    pub insights: Arc<dyn InsightStore>,
    pub run_logs: Arc<dyn RunLogStore>,

    /// Backend label for health reports
    pub backend: &'static str,
}

impl Stores {
    /// Empty in-memory stores
    pub fn memory() -> Self {
        Self::memory_with(Arc::new(MemoryBookingStore::new()))
    }

    /// In-memory stores around a pre-seeded booking store
    pub fn memory_with(bookings: Arc<MemoryBookingStore>) -> Self {
        Self {
            bookings,
            travel_cache: Arc::new(MemoryTravelCacheStore::new()),
            insights: Arc::new(MemoryInsightStore::new()),
            run_logs: Arc::new(MemoryRunLogStore::new()),
            backend: "memory",
        }
    }

    /// Every port served by one PostgreSQL store
    pub fn postgres(store: Arc<PostgresStore>) -> Self {
        Self {
            bookings: store.clone(),
            travel_cache: store.clone(),
            insights: store.clone(),
            run_logs: store,
            backend: "postgres",
        }
    }
}
