//! Travel-pair cache
//!
//! Keys are lossy on purpose: any two departures in the same weekday and hour
//! bucket of the business time zone share an entry.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use chrono_tz::Tz;
use fieldops_core::clock::Clock;
use fieldops_core::error::Result;
use fieldops_core::fingerprint::sha256_hex;
use fieldops_core::models::{CacheKey, TimeBucket, TravelCacheEntry, TravelEstimate, TravelPair};
use fieldops_core::SchedulingPolicy;
use fieldops_geo::normalize;
use fieldops_store::ports::TravelCacheStore;
use std::collections::HashMap;
use std::sync::Arc;

/// How departures and addresses map to cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeyScheme {
    pub timezone: Tz,
    pub bucket_hours: u32,
}

impl CacheKeyScheme {
    pub fn new(timezone: Tz, bucket_hours: u32) -> Self {
        Self { timezone, bucket_hours: bucket_hours.max(1) }
    }

    pub fn from_policy(policy: &SchedulingPolicy) -> Self {
        Self::new(policy.timezone, policy.time_bucket_hours)
    }

    /// Weekday and hour bucket of a departure in the business time zone
    pub fn time_bucket(&self, departure: DateTime<Utc>) -> TimeBucket {
        let local = departure.with_timezone(&self.timezone);
        TimeBucket {
            weekday: local.weekday().num_days_from_monday() as u8,
            hour_bucket: (local.hour() / self.bucket_hours) as u8,
        }
    }

    /// Cache key of a pair
    pub fn key(&self, origin: &str, destination: &str, departure: DateTime<Utc>) -> CacheKey {
        let bucket = self.time_bucket(departure);
        CacheKey(sha256_hex(&format!(
            "{}|{}|{}|{}",
            normalize(origin),
            normalize(destination),
            bucket.weekday,
            bucket.hour_bucket
        )))
    }

    pub fn key_for(&self, pair: &TravelPair) -> CacheKey {
        self.key(&pair.origin, &pair.destination, pair.departure)
    }
}

/// Result of a cache lookup
#[derive(Debug, Default)]
pub struct CacheLookup {
    /// Fresh entries by key
    pub cached: HashMap<CacheKey, TravelCacheEntry>,

    /// Pairs with no fresh entry, one per key
    pub uncached: Vec<TravelPair>,
}

/// Known estimates for a set of pairs; a missing key means "unknown"
#[derive(Debug, Clone)]
pub struct TravelLookup {
    scheme: CacheKeyScheme,
    estimates: HashMap<CacheKey, TravelEstimate>,
}

impl TravelLookup {
    pub fn new(scheme: CacheKeyScheme) -> Self {
        Self { scheme, estimates: HashMap::new() }
    }

    pub fn insert(&mut self, key: CacheKey, estimate: TravelEstimate) {
        self.estimates.insert(key, estimate);
    }

    pub fn get(&self, pair: &TravelPair) -> Option<&TravelEstimate> {
        self.estimates.get(&self.scheme.key_for(pair))
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}

/// Persistent, time-bucketed cache of travel estimates
pub struct TravelPairCache {
    store: Arc<dyn TravelCacheStore>,
    clock: Arc<dyn Clock>,
    scheme: CacheKeyScheme,
    ttl: Duration,
}

impl TravelPairCache {
    pub fn new(
        store: Arc<dyn TravelCacheStore>,
        clock: Arc<dyn Clock>,
        scheme: CacheKeyScheme,
        ttl_days: u32,
    ) -> Self {
        Self { store, clock, scheme, ttl: Duration::days(i64::from(ttl_days)) }
    }

    pub fn scheme(&self) -> CacheKeyScheme {
        self.scheme
    }

    /// Split pairs into fresh cache hits and misses
    ///
    /// Pairs sharing a key are looked up once. Expired entries are misses.
    pub async fn lookup_many(&self, pairs: &[TravelPair]) -> Result<CacheLookup> {
        let mut unique: Vec<(CacheKey, &TravelPair)> = Vec::new();
        for pair in pairs {
            let key = self.scheme.key_for(pair);
            if !unique.iter().any(|(k, _)| *k == key) {
                unique.push((key, pair));
            }
        }

        if unique.is_empty() {
            return Ok(CacheLookup::default());
        }

        let keys: Vec<CacheKey> = unique.iter().map(|(k, _)| k.clone()).collect();
        let now = self.clock.now();
        let cached: HashMap<CacheKey, TravelCacheEntry> = self
            .store
            .find_by_hashes(&keys)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| (entry.key.clone(), entry))
            .collect();

        let uncached = unique
            .into_iter()
            .filter(|(key, _)| !cached.contains_key(key))
            .map(|(_, pair)| pair.clone())
            .collect();

        Ok(CacheLookup { cached, uncached })
    }

    /// Upsert estimates with a fresh TTL, returning the written entries
    pub async fn store(&self, results: &[(TravelPair, TravelEstimate)]) -> Result<Vec<TravelCacheEntry>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let entries: Vec<TravelCacheEntry> = results
            .iter()
            .map(|(pair, estimate)| TravelCacheEntry {
                key: self.scheme.key_for(pair),
                origin_normalized: normalize(&pair.origin),
                destination_normalized: normalize(&pair.destination),
                time_bucket: self.scheme.time_bucket(pair.departure),
                estimate: estimate.clone(),
                created_at: now,
                expires_at: now + self.ttl,
            })
            .collect();

        self.store.bulk_upsert(&entries).await?;
        tracing::debug!(count = entries.len(), "Stored travel estimates");
        Ok(entries)
    }

    /// Drop expired entries from the backing store
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(self.clock.now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fieldops_core::clock::FixedClock;
    use fieldops_store::memory::MemoryTravelCacheStore;

    const TZ: Tz = chrono_tz::America::Toronto;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    // Tuesday 2026-03-03 at the given Toronto local time (UTC-5 in March before DST)
    fn tuesday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, hour + 5, minute, 0).unwrap()
    }

    fn cache(store: Arc<MemoryTravelCacheStore>) -> TravelPairCache {
        TravelPairCache::new(store, Arc::new(FixedClock(now())), CacheKeyScheme::new(TZ, 1), 90)
    }

    #[test]
    fn test_same_bucket_same_key() {
        let scheme = CacheKeyScheme::new(TZ, 1);
        let a = scheme.key("12 Main St", "4 Oak Ave", tuesday(14, 5));
        let b = scheme.key("12 main street", "4 oak avenue", tuesday(14, 55));
        let c = scheme.key("12 Main St", "4 Oak Ave", tuesday(15, 0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_direction_matters() {
        let scheme = CacheKeyScheme::new(TZ, 1);
        assert_ne!(scheme.key("A", "B", tuesday(9, 0)), scheme.key("B", "A", tuesday(9, 0)));
    }

    #[test]
    fn test_wider_buckets_coalesce_hours() {
        let scheme = CacheKeyScheme::new(TZ, 2);
        assert_eq!(scheme.time_bucket(tuesday(14, 0)), scheme.time_bucket(tuesday(15, 59)));
        assert_eq!(scheme.time_bucket(tuesday(14, 0)), TimeBucket { weekday: 1, hour_bucket: 7 });
    }

    #[tokio::test]
    async fn test_lookup_dedupes_and_splits() {
        let store = Arc::new(MemoryTravelCacheStore::new());
        let cache = cache(store.clone());

        let hit = TravelPair::new("A", "B", tuesday(9, 10));
        cache.store(&[(hit.clone(), TravelEstimate::new(20.0, 12.0))]).await.unwrap();

        let lookup = cache
            .lookup_many(&[
                hit.clone(),
                TravelPair::new("A", "B", tuesday(9, 50)),
                TravelPair::new("B", "C", tuesday(10, 0)),
                TravelPair::new("b", "c", tuesday(10, 30)),
            ])
            .await
            .unwrap();

        assert_eq!(lookup.cached.len(), 1);
        assert_eq!(lookup.uncached.len(), 1);
        assert_eq!(lookup.uncached[0].origin, "B");
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let store = Arc::new(MemoryTravelCacheStore::new());
        let writer = TravelPairCache::new(
            store.clone(),
            Arc::new(FixedClock(now() - Duration::days(91))),
            CacheKeyScheme::new(TZ, 1),
            90,
        );
        let pair = TravelPair::new("A", "B", tuesday(9, 0));
        writer.store(&[(pair.clone(), TravelEstimate::new(20.0, 12.0))]).await.unwrap();

        let lookup = cache(store.clone()).lookup_many(&[pair]).await.unwrap();
        assert!(lookup.cached.is_empty());
        assert_eq!(lookup.uncached.len(), 1);

        assert_eq!(cache(store.clone()).purge_expired().await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_sets_ttl_from_write_time() {
        let store = Arc::new(MemoryTravelCacheStore::new());
        let entries = cache(store)
            .store(&[(TravelPair::new("A", "B", tuesday(9, 0)), TravelEstimate::new(5.0, 2.0))])
            .await
            .unwrap();
        assert_eq!(entries[0].created_at, now());
        assert_eq!(entries[0].expires_at, now() + Duration::days(90));
        assert_eq!(entries[0].origin_normalized, "a");
    }
}
