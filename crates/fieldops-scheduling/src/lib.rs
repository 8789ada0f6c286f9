//! Fieldops Scheduling - Availability and schedule insight engine
//!
//! This crate wires the travel-pair cache, the route estimator, the
//! availability engine, and the schedule insight analyzer on top of the
//! storage ports and the routing provider. `SchedulingServices` builds the
//! whole graph from resolved configuration.

pub mod availability;
pub mod estimator;
pub mod insights;
pub mod services;
pub mod travel_cache;

pub use availability::AvailabilityEngine;
pub use estimator::{EstimatorConfig, RouteEstimator};
pub use insights::{AnalysisReport, AnalysisRequest, InsightAnalyzer};
pub use services::SchedulingServices;
pub use travel_cache::{CacheKeyScheme, CacheLookup, TravelLookup, TravelPairCache};
