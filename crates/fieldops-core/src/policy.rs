//! Business rules that shape availability and insight analysis

use chrono::{Duration, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::LayeredConfig;
use crate::service_day::SERVICE_DAY_CUTOFF_HOUR;

/// Constraints applied when deciding whether a day can take a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingPolicy {
    /// Business time zone used for local dates, buckets, and cutoffs
    pub timezone: Tz,

    /// Weekdays on which no work is scheduled
    pub closed_weekdays: Vec<Weekday>,

    /// Turnaround buffer added to a job's effective duration when blocking the day
    pub turnaround_buffer_minutes: i64,

    /// Ceiling on total driving per technician-day
    pub daily_drive_ceiling_minutes: f64,

    /// A neighbor leg at or under this is considered on-route
    pub close_route_minutes: f64,

    /// Idle gap after which the technician is routed back to the depot
    pub depot_return_gap_minutes: i64,

    /// Local hour separating one service day from the next
    pub service_day_cutoff_hour: u32,

    /// Technician home base
    pub depot_address: Option<String>,

    /// Width of travel-cache time buckets
    pub time_bucket_hours: u32,

    /// Longest date range a single query may cover
    pub max_range_days: i64,

    /// Longest job a single availability request may ask for
    pub max_job_hours: f64,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Toronto,
            closed_weekdays: vec![Weekday::Fri, Weekday::Sat],
            turnaround_buffer_minutes: 15,
            daily_drive_ceiling_minutes: 240.0,
            close_route_minutes: 30.0,
            depot_return_gap_minutes: 120,
            service_day_cutoff_hour: SERVICE_DAY_CUTOFF_HOUR,
            depot_address: None,
            time_bucket_hours: 1,
            max_range_days: 62,
            max_job_hours: 24.0,
        }
    }
}

impl SchedulingPolicy {
    /// Build a policy from resolved configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            timezone: config.business_timezone.value,
            depot_address: config.depot_address.value.clone(),
            time_bucket_hours: config.time_bucket_hours.value,
            ..Self::default()
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_depot(mut self, depot: impl Into<String>) -> Self {
        self.depot_address = Some(depot.into());
        self
    }

    pub fn turnaround_buffer(&self) -> Duration {
        Duration::minutes(self.turnaround_buffer_minutes)
    }

    pub fn depot_return_gap(&self) -> Duration {
        Duration::minutes(self.depot_return_gap_minutes)
    }

    pub fn is_closed(&self, weekday: Weekday) -> bool {
        self.closed_weekdays.contains(&weekday)
    }
}

/// Thresholds for the schedule insight rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Travel minutes above which a day is overloaded (warning)
    pub travel_warning_minutes: f64,

    /// Travel minutes above which overload is critical
    pub travel_critical_minutes: f64,

    /// Minimum travel for a route-efficiency finding
    pub inefficiency_min_travel_minutes: f64,

    /// Minimum travel-to-work ratio for a route-efficiency finding
    pub inefficiency_ratio: f64,

    /// Overnight gaps under this are reported
    pub rest_warning_hours: f64,

    /// Overnight gaps under this are critical
    pub rest_critical_hours: f64,

    /// Due items this many days out (or fewer) are critical
    pub due_critical_days: i64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            travel_warning_minutes: 150.0,
            travel_critical_minutes: 220.0,
            inefficiency_min_travel_minutes: 90.0,
            inefficiency_ratio: 0.4,
            rest_warning_hours: 8.0,
            rest_critical_hours: 6.0,
            due_critical_days: 1,
        }
    }
}
