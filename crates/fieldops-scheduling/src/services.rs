//! Wiring of the scheduling components over one set of stores

use fieldops_core::clock::Clock;
use fieldops_core::config::LayeredConfig;
use fieldops_core::SchedulingPolicy;
use fieldops_geo::RoutingProvider;
use fieldops_llm::InsightEnhancer;
use fieldops_store::Stores;
use std::sync::Arc;
use std::time::Duration;

use crate::availability::AvailabilityEngine;
use crate::estimator::{EstimatorConfig, RouteEstimator};
use crate::insights::InsightAnalyzer;
use crate::travel_cache::{CacheKeyScheme, TravelPairCache};

/// The availability engine and insight analyzer sharing one travel cache
pub struct SchedulingServices {
    pub availability: AvailabilityEngine,
    pub analyzer: InsightAnalyzer,
    pub estimator: Arc<RouteEstimator>,
}

impl SchedulingServices {
    pub fn build(
        stores: &Stores,
        provider: Arc<dyn RoutingProvider>,
        config: &LayeredConfig,
        enhancer: Option<Arc<dyn InsightEnhancer>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = SchedulingPolicy::from_config(config);

        let cache = Arc::new(TravelPairCache::new(
            stores.travel_cache.clone(),
            clock.clone(),
            CacheKeyScheme::from_policy(&policy),
            config.cache_ttl_days.value,
        ));
        let estimator = Arc::new(RouteEstimator::new(
            provider,
            cache,
            clock.clone(),
            EstimatorConfig {
                concurrency: config.routing_concurrency.value,
                timeout: Duration::from_secs(config.routing_timeout_secs.value),
            },
        ));

        let availability = AvailabilityEngine::new(
            stores.bookings.clone(),
            estimator.clone(),
            policy.clone(),
            clock.clone(),
        );

        let mut analyzer = InsightAnalyzer::new(
            stores.bookings.clone(),
            stores.insights.clone(),
            stores.run_logs.clone(),
            estimator.clone(),
            policy,
            clock,
        );
        if let Some(enhancer) = enhancer {
            tracing::info!(enhancer = enhancer.name(), "Insight enhancer enabled");
            analyzer = analyzer.with_enhancer(enhancer);
        }

        Self { availability, analyzer, estimator }
    }
}
