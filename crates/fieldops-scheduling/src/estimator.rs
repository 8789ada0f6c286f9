//! Route estimator: fills travel-cache misses from the routing provider

use fieldops_core::clock::Clock;
use fieldops_core::error::Result;
use fieldops_core::models::{TravelCacheEntry, TravelEstimate, TravelPair};
use fieldops_geo::{normalize, ProviderError, RouteEstimate, RoutingProvider};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::travel_cache::{TravelLookup, TravelPairCache};

/// Concurrency and timeout settings for provider calls
#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Provider calls in flight per batch
    pub concurrency: usize,

    /// Deadline for each provider call
    pub timeout: Duration,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { concurrency: 5, timeout: Duration::from_secs(10) }
    }
}

/// Estimates travel pairs through the provider and records them in the cache
pub struct RouteEstimator {
    provider: Arc<dyn RoutingProvider>,
    cache: Arc<TravelPairCache>,
    clock: Arc<dyn Clock>,
    config: EstimatorConfig,
}

impl RouteEstimator {
    pub fn new(
        provider: Arc<dyn RoutingProvider>,
        cache: Arc<TravelPairCache>,
        clock: Arc<dyn Clock>,
        config: EstimatorConfig,
    ) -> Self {
        Self { provider, cache, clock, config }
    }

    pub fn cache(&self) -> &TravelPairCache {
        &self.cache
    }

    /// Estimate pairs in bounded batches and store the successes
    ///
    /// Failed or timed-out pairs are dropped without retry. Storage errors
    /// propagate.
    pub async fn estimate(&self, pairs: &[TravelPair]) -> Result<Vec<TravelCacheEntry>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut successes = Vec::with_capacity(pairs.len());
        for batch in pairs.chunks(self.config.concurrency.max(1)) {
            let results = join_all(batch.iter().map(|pair| self.estimate_one(pair))).await;
            for (pair, result) in batch.iter().zip(results) {
                match result {
                    Ok(route) => successes.push((pair.clone(), sanitize(&route))),
                    Err(e) => tracing::warn!(
                        provider = self.provider.name(),
                        origin = %pair.origin,
                        destination = %pair.destination,
                        error = %e,
                        "Travel estimate failed"
                    ),
                }
            }
        }

        tracing::info!(
            requested = pairs.len(),
            estimated = successes.len(),
            "Estimated travel pairs"
        );

        self.cache.store(&successes).await
    }

    /// Resolve every pair from the cache, estimating the misses
    ///
    /// Pairs whose endpoints normalize to the same address resolve to zero
    /// without touching the cache or the provider.
    pub async fn resolve(&self, pairs: &[TravelPair]) -> Result<TravelLookup> {
        let scheme = self.cache.scheme();
        let mut lookup = TravelLookup::new(scheme);

        let (same_place, to_resolve): (Vec<&TravelPair>, Vec<&TravelPair>) = pairs
            .iter()
            .partition(|p| normalize(&p.origin) == normalize(&p.destination));

        for pair in same_place {
            lookup.insert(scheme.key_for(pair), TravelEstimate::zero());
        }

        let to_resolve: Vec<TravelPair> = to_resolve.into_iter().cloned().collect();
        let hits = self.cache.lookup_many(&to_resolve).await?;
        tracing::debug!(
            hits = hits.cached.len(),
            misses = hits.uncached.len(),
            "Travel cache lookup"
        );

        for (key, entry) in hits.cached {
            lookup.insert(key, entry.estimate);
        }
        for entry in self.estimate(&hits.uncached).await? {
            lookup.insert(entry.key, entry.estimate);
        }

        Ok(lookup)
    }

    async fn estimate_one(&self, pair: &TravelPair) -> std::result::Result<RouteEstimate, ProviderError> {
        // Traffic-aware providers reject departures in the past
        let departure = Some(pair.departure).filter(|d| *d > self.clock.now());

        tokio::time::timeout(
            self.config.timeout,
            self.provider.route(&pair.origin, &pair.destination, departure),
        )
        .await
        .map_err(|_| ProviderError::Timeout)?
    }
}

/// Convert a raw provider answer to minutes and kilometres
///
/// Non-finite or negative numbers become zero; both values are rounded to one
/// decimal place.
pub fn sanitize(route: &RouteEstimate) -> TravelEstimate {
    let mut estimate = TravelEstimate::new(
        round_tenth(route.duration_seconds / 60.0),
        round_tenth(route.distance_meters / 1000.0),
    );
    estimate.polyline = route.polyline.clone();
    estimate
}

fn round_tenth(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}
