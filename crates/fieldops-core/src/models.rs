pub mod availability;
pub mod booking;
pub mod insight;
pub mod travel;

pub use availability::{AvailabilityRequest, DayAvailability, UnavailableReason};
pub use booking::{Booking, BookingId, DueItem, TechnicianId};
pub use insight::{
    InsightDraft, InsightFilter, InsightId, InsightKind, InsightRunLog, InsightSource,
    InsightStatus, RunTrigger, ScheduleInsight, Severity,
};
pub use travel::{CacheKey, DayTravelSummary, TimeBucket, TravelCacheEntry, TravelEstimate, TravelPair};
