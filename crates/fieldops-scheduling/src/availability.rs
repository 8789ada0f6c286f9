//! Availability engine
//!
//! For each calendar day in a request the checks run in a fixed order and the
//! first failing check decides the reason:
//!
//! 1. closed weekday, or a start that has already passed
//! 2. overlap with an existing booking's blocked interval
//! 3. travel to and from the neighboring bookings
//! 4. the daily drive-time ceiling, waived for jobs close to the route
//!
//! Checks 3 and 4 need a location and are skipped without one. An unknown
//! travel estimate always makes the day unavailable.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use fieldops_core::clock::Clock;
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::models::booking::hours_to_duration;
use fieldops_core::models::{
    AvailabilityRequest, Booking, DayAvailability, TravelPair, UnavailableReason,
};
use fieldops_core::service_day::{day_bounds, days_in_range, local_to_utc};
use fieldops_core::SchedulingPolicy;
use fieldops_geo::{addresses_match, build_segments, sort_by_service_day, summarize, validate_address};
use fieldops_store::ports::BookingStore;
use futures::future::join_all;
use std::sync::Arc;

use crate::estimator::RouteEstimator;

/// Decides which days can take a requested job
pub struct AvailabilityEngine {
    bookings: Arc<dyn BookingStore>,
    estimator: Arc<RouteEstimator>,
    policy: SchedulingPolicy,
    clock: Arc<dyn Clock>,
}

/// The requested job placed on one day
struct Candidate<'a> {
    date: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    blocked_end: DateTime<Utc>,
    location: Option<&'a str>,
}

impl AvailabilityEngine {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        estimator: Arc<RouteEstimator>,
        policy: SchedulingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { bookings, estimator, policy, clock }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Evaluate every day of the request, in calendar order
    pub async fn get_available_days(&self, request: &AvailabilityRequest) -> Result<Vec<DayAvailability>> {
        self.validate(request)?;

        let days: Vec<NaiveDate> = days_in_range(request.date_from, request.date_to).collect();
        let verdicts = join_all(days.iter().map(|date| self.evaluate_day(*date, request))).await;
        let verdicts = verdicts.into_iter().collect::<Result<Vec<_>>>()?;

        let available = verdicts.iter().filter(|d| d.available).count();
        tracing::info!(
            from = %request.date_from,
            to = %request.date_to,
            days = verdicts.len(),
            available,
            "Evaluated availability"
        );

        Ok(verdicts)
    }

    fn validate(&self, request: &AvailabilityRequest) -> Result<()> {
        if request.date_from > request.date_to {
            return Err(FieldopsError::InvalidDateRange {
                reason: format!("{} is after {}", request.date_from, request.date_to),
            });
        }

        let span = (request.date_to - request.date_from).num_days() + 1;
        if span > self.policy.max_range_days {
            return Err(FieldopsError::InvalidDateRange {
                reason: format!("{} days exceeds the {}-day limit", span, self.policy.max_range_days),
            });
        }

        if !request.duration_hours.is_finite() || request.duration_hours <= 0.0 {
            return Err(FieldopsError::InvalidRequest {
                field: "duration_hours".to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        if request.duration_hours > self.policy.max_job_hours {
            return Err(FieldopsError::InvalidRequest {
                field: "duration_hours".to_string(),
                reason: format!("must not exceed {} hours", self.policy.max_job_hours),
            });
        }

        if let Some(location) = &request.location {
            validate_address(location)?;
        }

        Ok(())
    }

    async fn evaluate_day(&self, date: NaiveDate, request: &AvailabilityRequest) -> Result<DayAvailability> {
        if self.policy.is_closed(date.weekday()) {
            return Ok(DayAvailability::unavailable(date, UnavailableReason::Closed));
        }

        let start = local_to_utc(date, request.time, self.policy.timezone);
        if start < self.clock.now() {
            return Ok(DayAvailability::unavailable(date, UnavailableReason::Passed));
        }

        let end = start + hours_to_duration(request.duration_hours);
        let candidate = Candidate {
            date,
            start,
            end,
            blocked_end: end + self.policy.turnaround_buffer(),
            location: request.location.as_deref(),
        };

        let (day_start, day_end) = day_bounds(date, self.policy.timezone);
        let mut jobs = self
            .bookings
            .find_bookings_in_range(day_start, day_end, request.technician_id.as_ref())
            .await?;

        let buffer = self.policy.turnaround_buffer();
        if jobs
            .iter()
            .any(|job| candidate.start < job.blocked_end(buffer) && job.start < candidate.blocked_end)
        {
            return Ok(DayAvailability::unavailable(date, UnavailableReason::AlreadyBooked));
        }

        let Some(location) = candidate.location else {
            return Ok(DayAvailability::available(date));
        };

        sort_by_service_day(&mut jobs, self.policy.timezone, self.policy.service_day_cutoff_hour);
        self.check_travel(&candidate, location, &jobs).await
    }

    async fn check_travel(
        &self,
        candidate: &Candidate<'_>,
        location: &str,
        jobs: &[Booking],
    ) -> Result<DayAvailability> {
        let date = candidate.date;

        // Latest-ending job that is free before the requested start
        let previous = jobs
            .iter()
            .filter(|job| job.travel_end() <= candidate.start)
            .max_by_key(|job| job.travel_end());

        // Earliest job starting after the requested job ends
        let next = jobs
            .iter()
            .filter(|job| job.start >= candidate.end)
            .min_by_key(|job| job.start);

        let previous_leg =
            previous.map(|job| TravelPair::new(job.location.clone(), location, job.travel_end()));
        let next_leg = next.map(|job| TravelPair::new(location, job.location.clone(), candidate.end));

        let segments = build_segments(
            jobs,
            self.policy.depot_address.as_deref(),
            self.policy.depot_return_gap(),
        );

        let mut pairs: Vec<TravelPair> = segments.iter().map(|s| s.to_pair()).collect();
        pairs.extend(previous_leg.iter().cloned());
        pairs.extend(next_leg.iter().cloned());
        let lookup = self.estimator.resolve(&pairs).await?;

        let previous_minutes = match &previous_leg {
            Some(pair) => match lookup.get(pair) {
                Some(estimate) => Some(estimate.duration_minutes),
                None => return Ok(fallback(date)),
            },
            None => None,
        };
        let next_minutes = match &next_leg {
            Some(pair) => match lookup.get(pair) {
                Some(estimate) => Some(estimate.duration_minutes),
                None => return Ok(fallback(date)),
            },
            None => None,
        };

        if let (Some(job), Some(minutes)) = (previous, previous_minutes) {
            if job.travel_end() + hours_to_duration(minutes / 60.0) > candidate.start {
                return Ok(DayAvailability::unavailable(date, UnavailableReason::NotEnoughTravelTime));
            }
        }
        if let (Some(job), Some(minutes)) = (next, next_minutes) {
            if candidate.end + hours_to_duration(minutes / 60.0) > job.start {
                return Ok(DayAvailability::unavailable(date, UnavailableReason::NotEnoughTravelTime));
            }
        }

        let summary = summarize(&segments, |segment| lookup.get(&segment.to_pair()));
        if !summary.is_complete() {
            tracing::debug!(%date, missing = summary.missing_estimates, "Day route has unknown legs");
            return Ok(fallback(date));
        }

        let projected =
            summary.total_minutes + previous_minutes.unwrap_or(0.0) + next_minutes.unwrap_or(0.0);

        if projected > self.policy.daily_drive_ceiling_minutes {
            let close_leg = [previous_minutes, next_minutes]
                .into_iter()
                .flatten()
                .any(|minutes| minutes <= self.policy.close_route_minutes);
            let same_site = jobs.iter().any(|job| addresses_match(&job.location, location));

            if !close_leg && !same_site {
                return Ok(DayAvailability::unavailable(date, UnavailableReason::ExceedsDriveTimeLimit)
                    .with_travel_minutes(projected));
            }
        }

        Ok(DayAvailability::available(date).with_travel_minutes(projected))
    }
}

fn fallback(date: NaiveDate) -> DayAvailability {
    DayAvailability::unavailable(date, UnavailableReason::TravelEstimateUnavailable)
}
