//! Fieldops Geo - Addresses, day routes, and the routing provider port
//!
//! This crate canonicalizes free-text addresses, lays out the travel legs of a
//! technician-day, and defines the port through which travel estimates are
//! requested from an external routing service.

pub mod address;
pub mod provider;
pub mod route;

pub use address::{addresses_match, normalize, validate_address};
pub use provider::{
    DistanceMatrixProvider, ProviderError, RouteEstimate, RoutingProvider, UnconfiguredProvider,
};
pub use route::{build_segments, sort_by_service_day, summarize, Segment, SegmentKind};
