//! Day routing: the travel legs of one technician-day
//!
//! A route starts and ends at the depot when one is known. Long idle gaps
//! between jobs send the technician back to the depot instead of waiting
//! on site. Legs whose endpoints normalize to the same address are dropped.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use fieldops_core::models::{Booking, DayTravelSummary, TravelEstimate, TravelPair};
use fieldops_core::service_day::service_day_ordering_key;
use serde::{Deserialize, Serialize};

use crate::address::normalize;

/// Role of a leg within the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Depot to the first job, or back out after a depot return
    FromDepot,
    /// Directly from one job to the next
    BetweenJobs,
    /// Job back to the depot, mid-day or at the end of the day
    ToDepot,
}

/// One travel leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub origin: String,
    pub destination: String,

    /// Departure instant used for cache bucketing and estimation
    pub departure: DateTime<Utc>,

    pub kind: SegmentKind,
}

impl Segment {
    fn new(
        origin: &str,
        destination: &str,
        departure: DateTime<Utc>,
        kind: SegmentKind,
    ) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure,
            kind,
        }
    }

    /// The travel query this leg needs answered
    pub fn to_pair(&self) -> TravelPair {
        TravelPair::new(self.origin.clone(), self.destination.clone(), self.departure)
    }
}

/// Sort jobs into service-day order
pub fn sort_by_service_day(jobs: &mut [Booking], tz: Tz, cutoff_hour: u32) {
    jobs.sort_by(|a, b| {
        service_day_ordering_key(a.start, tz, cutoff_hour)
            .cmp(&service_day_ordering_key(b.start, tz, cutoff_hour))
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Build the travel legs for a technician-day
///
/// `jobs` must already be in service-day order.
pub fn build_segments(
    jobs: &[Booking],
    depot: Option<&str>,
    depot_return_gap: Duration,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let (Some(first), Some(last)) = (jobs.first(), jobs.last()) else {
        return segments;
    };

    if let Some(depot) = depot {
        segments.push(Segment::new(depot, &first.location, first.start, SegmentKind::FromDepot));
    }

    for pair in jobs.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let idle = next.start - current.travel_end();

        match depot {
            Some(depot) if idle >= depot_return_gap => {
                segments.push(Segment::new(
                    &current.location,
                    depot,
                    current.travel_end(),
                    SegmentKind::ToDepot,
                ));
                segments.push(Segment::new(
                    depot,
                    &next.location,
                    next.start,
                    SegmentKind::FromDepot,
                ));
            }
            _ => segments.push(Segment::new(
                &current.location,
                &next.location,
                current.travel_end(),
                SegmentKind::BetweenJobs,
            )),
        }
    }

    if let Some(depot) = depot {
        segments.push(Segment::new(&last.location, depot, last.travel_end(), SegmentKind::ToDepot));
    }

    segments.retain(|s| normalize(&s.origin) != normalize(&s.destination));
    segments
}

/// Total the legs of a day using whatever estimates are known
pub fn summarize<'a, F>(segments: &'a [Segment], mut estimate_for: F) -> DayTravelSummary
where
    F: FnMut(&'a Segment) -> Option<&'a TravelEstimate>,
{
    let mut summary = DayTravelSummary { segment_count: segments.len(), ..Default::default() };
    for segment in segments {
        match estimate_for(segment) {
            Some(estimate) => {
                summary.total_minutes += estimate.duration_minutes;
                summary.total_km += estimate.distance_km;
            }
            None => summary.missing_estimates += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fieldops_core::models::{BookingId, TechnicianId};

    fn job(id: &str, hour: u32, minute: u32, hours: f64, location: &str) -> Booking {
        Booking {
            id: BookingId::from(id),
            technician_ids: vec![TechnicianId::from("tech-1")],
            start: Utc.with_ymd_and_hms(2026, 3, 3, hour, minute, 0).unwrap(),
            duration_hours: hours,
            actual_duration_hours: None,
            historical_duration_hours: None,
            location: location.to_string(),
        }
    }

    fn gap() -> Duration {
        Duration::hours(2)
    }

    #[test]
    fn test_no_jobs_no_segments() {
        assert!(build_segments(&[], Some("Depot"), gap()).is_empty());
    }

    #[test]
    fn test_route_without_depot_links_jobs() {
        let jobs = vec![job("a", 9, 0, 1.0, "A"), job("b", 10, 30, 1.0, "B")];
        let segments = build_segments(&jobs, None, gap());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].origin, "A");
        assert_eq!(segments[0].destination, "B");
        assert_eq!(segments[0].departure, jobs[0].travel_end());
        assert_eq!(segments[0].kind, SegmentKind::BetweenJobs);
    }

    #[test]
    fn test_route_with_depot_starts_and_ends_at_depot() {
        let jobs = vec![job("a", 9, 0, 1.0, "A"), job("b", 10, 30, 1.0, "B")];
        let segments = build_segments(&jobs, Some("Depot"), gap());
        let legs: Vec<(&str, &str)> =
            segments.iter().map(|s| (s.origin.as_str(), s.destination.as_str())).collect();
        assert_eq!(legs, vec![("Depot", "A"), ("A", "B"), ("B", "Depot")]);
        assert_eq!(segments[0].departure, jobs[0].start);
        assert_eq!(segments[2].departure, jobs[1].travel_end());
    }

    #[test]
    fn test_long_idle_gap_returns_to_depot() {
        // A ends 10:00, B starts 12:00: a two-hour gap triggers the depot return
        let jobs = vec![job("a", 9, 0, 1.0, "A"), job("b", 12, 0, 1.0, "B")];
        let segments = build_segments(&jobs, Some("Depot"), gap());
        let legs: Vec<(&str, &str)> =
            segments.iter().map(|s| (s.origin.as_str(), s.destination.as_str())).collect();
        assert_eq!(
            legs,
            vec![("Depot", "A"), ("A", "Depot"), ("Depot", "B"), ("B", "Depot")]
        );
        assert_eq!(segments[1].departure, jobs[0].travel_end());
        assert_eq!(segments[2].departure, jobs[1].start);
    }

    #[test]
    fn test_long_gap_without_depot_links_directly() {
        let jobs = vec![job("a", 9, 0, 1.0, "A"), job("b", 15, 0, 1.0, "B")];
        let segments = build_segments(&jobs, None, gap());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::BetweenJobs);
    }

    #[test]
    fn test_same_address_legs_are_elided() {
        let jobs = vec![
            job("a", 9, 0, 1.0, "12 Main St"),
            job("b", 10, 15, 1.0, "12 main street"),
            job("c", 11, 30, 1.0, "Depot Rd"),
        ];
        let segments = build_segments(&jobs, Some("depot rd"), gap());
        let legs: Vec<(&str, &str)> =
            segments.iter().map(|s| (s.origin.as_str(), s.destination.as_str())).collect();
        assert_eq!(legs, vec![("depot rd", "12 Main St"), ("12 main street", "Depot Rd")]);
    }

    #[test]
    fn test_sort_by_service_day_puts_pre_cutoff_job_in_previous_day() {
        let tz = chrono_tz::UTC;
        let mut jobs = vec![
            Booking {
                start: Utc.with_ymd_and_hms(2026, 3, 3, 1, 0, 0).unwrap(),
                ..job("late", 0, 0, 1.0, "L")
            },
            job("morning", 8, 0, 1.0, "M"),
            job("evening", 20, 0, 1.0, "E"),
        ];
        sort_by_service_day(&mut jobs, tz, 3);
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.0.as_str()).collect();
        // 01:00 on the 3rd is the tail of the 2nd, so it sorts first by date key
        assert_eq!(ids, vec!["late", "morning", "evening"]);
    }

    #[test]
    fn test_summarize_counts_missing() {
        let jobs = vec![job("a", 9, 0, 1.0, "A"), job("b", 10, 30, 1.0, "B")];
        let segments = build_segments(&jobs, Some("Depot"), gap());
        let known = TravelEstimate::new(20.0, 15.0);
        let summary = summarize(&segments, |s| if s.origin == "Depot" { None } else { Some(&known) });
        assert_eq!(summary.segment_count, 3);
        assert_eq!(summary.missing_estimates, 1);
        assert_eq!(summary.total_minutes, 40.0);
        assert_eq!(summary.total_km, 30.0);
        assert!(!summary.is_complete());
    }
}
