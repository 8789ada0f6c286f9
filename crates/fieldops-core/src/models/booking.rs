use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a booking in the external booking store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unique identifier for a technician
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnicianId(pub String);

impl fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TechnicianId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An existing job owned by the booking store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,

    /// Technicians assigned to the job
    #[serde(default)]
    pub technician_ids: Vec<TechnicianId>,

    /// Scheduled start instant
    pub start: DateTime<Utc>,

    /// Nominal scheduled duration in hours
    pub duration_hours: f64,

    /// Recorded actual duration, when the job has been completed
    #[serde(default)]
    pub actual_duration_hours: Option<f64>,

    /// Historical average for this kind of job at this client
    #[serde(default)]
    pub historical_duration_hours: Option<f64>,

    /// Free-text service address
    pub location: String,
}

impl Booking {
    /// Best-known duration: actual, then historical, then the nominal schedule
    pub fn effective_duration_hours(&self) -> f64 {
        [self.actual_duration_hours, self.historical_duration_hours]
            .into_iter()
            .flatten()
            .find(|hours| hours.is_finite() && *hours > 0.0)
            .unwrap_or_else(|| {
                if self.duration_hours.is_finite() && self.duration_hours > 0.0 {
                    self.duration_hours
                } else {
                    0.0
                }
            })
    }

    /// Effective duration as a time delta
    pub fn effective_duration(&self) -> Duration {
        hours_to_duration(self.effective_duration_hours())
    }

    /// When the technician is free to leave the site (turnaround buffer excluded)
    pub fn travel_end(&self) -> DateTime<Utc> {
        self.start + self.effective_duration()
    }

    /// End of the blocked footprint: effective duration plus the turnaround buffer
    pub fn blocked_end(&self, turnaround_buffer: Duration) -> DateTime<Utc> {
        self.travel_end() + turnaround_buffer
    }

    /// Whether the booking is assigned to the given technician
    pub fn is_assigned_to(&self, technician: &TechnicianId) -> bool {
        self.technician_ids.iter().any(|t| t == technician)
    }
}

/// Due-but-unscheduled work item exposed by the booking store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueItem {
    /// Unique identifier
    pub id: String,

    /// Short description of the work
    pub title: String,

    /// Date the work is due
    pub due_date: NaiveDate,

    /// Service address, when known
    #[serde(default)]
    pub location: Option<String>,

    /// Preferred technician, when known
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
}

/// Upper bound applied to any duration derived from stored hours
pub const MAX_DURATION_HOURS: f64 = 24.0 * 366.0;

/// Convert fractional hours to a millisecond-precision duration
///
/// Values are clamped to [`MAX_DURATION_HOURS`] so instant arithmetic cannot overflow.
pub fn hours_to_duration(hours: f64) -> Duration {
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::zero();
    }
    let hours = hours.min(MAX_DURATION_HOURS);
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn booking(duration: f64, actual: Option<f64>, historical: Option<f64>) -> Booking {
        Booking {
            id: BookingId::from("b-1"),
            technician_ids: vec![TechnicianId::from("tech-1")],
            start: Utc.with_ymd_and_hms(2026, 3, 3, 14, 0, 0).unwrap(),
            duration_hours: duration,
            actual_duration_hours: actual,
            historical_duration_hours: historical,
            location: "12 Main St".to_string(),
        }
    }

    #[test]
    fn test_effective_duration_prefers_actual() {
        let b = booking(2.0, Some(1.5), Some(3.0));
        assert_eq!(b.effective_duration_hours(), 1.5);
    }

    #[test]
    fn test_effective_duration_falls_back_to_historical_then_nominal() {
        assert_eq!(booking(2.0, None, Some(3.0)).effective_duration_hours(), 3.0);
        assert_eq!(booking(2.0, Some(0.0), None).effective_duration_hours(), 2.0);
        assert_eq!(booking(2.0, Some(f64::NAN), None).effective_duration_hours(), 2.0);
    }

    #[test]
    fn test_travel_end_and_blocked_end() {
        let b = booking(2.0, None, None);
        assert_eq!(b.travel_end(), Utc.with_ymd_and_hms(2026, 3, 3, 16, 0, 0).unwrap());
        assert_eq!(
            b.blocked_end(Duration::minutes(15)),
            Utc.with_ymd_and_hms(2026, 3, 3, 16, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_is_assigned_to() {
        let b = booking(1.0, None, None);
        assert!(b.is_assigned_to(&TechnicianId::from("tech-1")));
        assert!(!b.is_assigned_to(&TechnicianId::from("tech-2")));
    }

    #[test]
    fn test_hours_to_duration_rejects_invalid() {
        assert_eq!(hours_to_duration(-1.0), Duration::zero());
        assert_eq!(hours_to_duration(f64::INFINITY), Duration::zero());
        assert_eq!(hours_to_duration(0.25), Duration::minutes(15));
    }

    #[test]
    fn test_huge_duration_is_clamped() {
        assert_eq!(hours_to_duration(1e10), Duration::hours(24 * 366));

        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut job = booking(1e12, None, None);
        job.start = start;
        assert_eq!(job.travel_end(), start + Duration::hours(24 * 366));
    }
}
