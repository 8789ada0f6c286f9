use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::booking::TechnicianId;

/// A candidate appointment tested against existing bookings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// First calendar day to evaluate (inclusive)
    pub date_from: NaiveDate,

    /// Last calendar day to evaluate (inclusive)
    pub date_to: NaiveDate,

    /// Requested local start time on each day
    pub time: NaiveTime,

    /// Requested duration in hours
    pub duration_hours: f64,

    /// Service address for the new job
    #[serde(default)]
    pub location: Option<String>,

    /// Restrict bookings to one technician's schedule
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
}

impl AvailabilityRequest {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate, time: NaiveTime, duration_hours: f64) -> Self {
        Self { date_from, date_to, time, duration_hours, location: None, technician_id: None }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_technician(mut self, technician: TechnicianId) -> Self {
        self.technician_id = Some(technician);
        self
    }
}

/// Why a day cannot take the requested job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnavailableReason {
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "already booked")]
    AlreadyBooked,
    #[serde(rename = "travel estimate unavailable — conservative fallback")]
    TravelEstimateUnavailable,
    #[serde(rename = "not enough travel time")]
    NotEnoughTravelTime,
    #[serde(rename = "exceeds drive-time limit")]
    ExceedsDriveTimeLimit,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailableReason::Closed => "closed",
            UnavailableReason::Passed => "passed",
            UnavailableReason::AlreadyBooked => "already booked",
            UnavailableReason::TravelEstimateUnavailable => {
                "travel estimate unavailable — conservative fallback"
            }
            UnavailableReason::NotEnoughTravelTime => "not enough travel time",
            UnavailableReason::ExceedsDriveTimeLimit => "exceeds drive-time limit",
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,

    /// Projected travel minutes for the day including the new job's legs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_minutes: Option<f64>,
}

impl DayAvailability {
    pub fn available(date: NaiveDate) -> Self {
        Self { date, available: true, reason: None, travel_minutes: None }
    }

    pub fn unavailable(date: NaiveDate, reason: UnavailableReason) -> Self {
        Self { date, available: false, reason: Some(reason), travel_minutes: None }
    }

    pub fn with_travel_minutes(mut self, minutes: f64) -> Self {
        self.travel_minutes = Some(minutes);
        self
    }
}
