//! Availability engine behavior over in-memory stores

mod common;

use common::*;
use fieldops_core::error::FieldopsError;
use fieldops_core::models::{AvailabilityRequest, TravelEstimate, TravelPair, UnavailableReason};
use fieldops_core::SchedulingPolicy;

fn tuesday_request(hour: u32, minute: u32, location: &str) -> AvailabilityRequest {
    AvailabilityRequest::new(date(3), date(3), time(hour, minute), 1.0).with_location(location)
}

/// Booking A at L1 ending 14:00 Tuesday, with a cached 40-minute L1 -> L2 leg
async fn neighbor_scenario() -> Harness {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    harness.bookings.insert(booking("a", "t1", local(3, 12, 0), 2.0, "10 First St"));
    harness
        .cache
        .store(&[(
            TravelPair::new("10 First St", "20 Second Ave", local(3, 14, 0)),
            TravelEstimate::new(40.0, 31.0),
        )])
        .await
        .unwrap();
    harness
}

#[tokio::test]
async fn test_closed_days_are_always_closed() {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    harness.bookings.insert(booking("fri", "t1", local(6, 9, 0), 1.0, "1 Main St"));

    // Thursday through Sunday
    let request = AvailabilityRequest::new(date(5), date(8), time(13, 0), 1.0);
    let days = harness.availability().get_available_days(&request).await.unwrap();

    let reasons: Vec<Option<UnavailableReason>> = days.iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![None, Some(UnavailableReason::Closed), Some(UnavailableReason::Closed), None]
    );
    assert_eq!(days[0].date, date(5));
    assert_eq!(days[3].date, date(8));
}

#[tokio::test]
async fn test_overlap_is_already_booked() {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    harness.bookings.insert(booking("a", "t1", local(3, 9, 0), 1.0, "1 Main St"));
    let engine = harness.availability();

    for (hour, minute) in [(9, 30), (8, 30), (10, 5)] {
        let request = AvailabilityRequest::new(date(3), date(3), time(hour, minute), 1.0);
        let days = engine.get_available_days(&request).await.unwrap();
        assert_eq!(
            days[0].reason,
            Some(UnavailableReason::AlreadyBooked),
            "start {:02}:{:02}",
            hour,
            minute
        );
    }

    // Clear of the 15-minute turnaround on both sides
    let request = AvailabilityRequest::new(date(3), date(3), time(10, 15), 1.0);
    assert!(engine.get_available_days(&request).await.unwrap()[0].available);
}

#[tokio::test]
async fn test_past_days_are_passed() {
    let harness = Harness::at(TableProvider::new(), SchedulingPolicy::default(), local(3, 12, 0));
    let request = AvailabilityRequest::new(date(2), date(4), time(10, 0), 1.0);
    let days = harness.availability().get_available_days(&request).await.unwrap();

    assert_eq!(days[0].reason, Some(UnavailableReason::Passed));
    assert_eq!(days[1].reason, Some(UnavailableReason::Passed));
    assert!(days[2].available);
}

#[tokio::test]
async fn test_start_twenty_minutes_after_neighbor_is_too_soon() {
    let harness = neighbor_scenario().await;
    let days = harness
        .availability()
        .get_available_days(&tuesday_request(14, 20, "20 Second Ave"))
        .await
        .unwrap();

    assert!(!days[0].available);
    assert_eq!(days[0].reason, Some(UnavailableReason::NotEnoughTravelTime));
    assert_eq!(harness.provider.calls(), 0);
}

#[tokio::test]
async fn test_start_forty_five_minutes_after_neighbor_fits() {
    let harness = neighbor_scenario().await;
    let days = harness
        .availability()
        .get_available_days(&tuesday_request(14, 45, "20 Second Ave"))
        .await
        .unwrap();

    assert!(days[0].available);
    assert_eq!(days[0].travel_minutes, Some(40.0));
    assert_eq!(harness.provider.calls(), 0);
}

#[tokio::test]
async fn test_next_neighbor_needs_travel_time() {
    let provider = TableProvider::new().with_route("20 Second Ave", "30 Third Rd", 30.0);
    let harness = Harness::new(provider, SchedulingPolicy::default());
    harness.bookings.insert(booking("b", "t1", local(3, 16, 0), 1.0, "30 Third Rd"));

    // Ends 15:45; 30 minutes of driving misses a 16:00 start
    let days = harness
        .availability()
        .get_available_days(&tuesday_request(14, 45, "20 Second Ave"))
        .await
        .unwrap();
    assert_eq!(days[0].reason, Some(UnavailableReason::NotEnoughTravelTime));
}

#[tokio::test]
async fn test_unknown_leg_is_conservative_fallback() {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    harness.bookings.insert(booking("a", "t1", local(3, 9, 0), 1.0, "1 Main St"));

    let days = harness
        .availability()
        .get_available_days(&tuesday_request(13, 0, "99 Unknown Ln"))
        .await
        .unwrap();

    assert_eq!(days[0].reason, Some(UnavailableReason::TravelEstimateUnavailable));
    assert_eq!(harness.provider.calls(), 1);
}

fn drive_limit_harness() -> Harness {
    let depot = "100 Yard Rd";
    let provider = TableProvider::new()
        .with_route(depot, "1 North St", 70.0)
        .with_route("1 North St", "2 South St", 60.0)
        .with_route("2 South St", depot, 70.0)
        .with_route("2 South St", "9 Far Rd", 45.0);
    let harness = Harness::new(provider, SchedulingPolicy::default().with_depot(depot));
    harness.bookings.insert(booking("n", "t1", local(3, 8, 0), 1.0, "1 North St"));
    harness.bookings.insert(booking("s", "t1", local(3, 10, 0), 1.0, "2 South St"));
    harness
}

#[tokio::test]
async fn test_far_job_on_full_day_exceeds_drive_limit() {
    let harness = drive_limit_harness();
    let days = harness
        .availability()
        .get_available_days(&tuesday_request(12, 0, "9 Far Rd"))
        .await
        .unwrap();

    assert_eq!(days[0].reason, Some(UnavailableReason::ExceedsDriveTimeLimit));
    assert_eq!(days[0].travel_minutes, Some(245.0));
}

#[tokio::test]
async fn test_job_at_existing_site_is_allowed_on_full_day() {
    let harness = drive_limit_harness();
    let days = harness
        .availability()
        .get_available_days(&tuesday_request(12, 0, "2 south street"))
        .await
        .unwrap();

    assert!(days[0].available);
    assert_eq!(days[0].travel_minutes, Some(200.0));
}

#[tokio::test]
async fn test_same_bucket_requests_share_cache() {
    let provider = TableProvider::new()
        .with_route("10 First St", "20 Second Ave", 20.0)
        .with_route("20 Second Ave", "30 Third Rd", 15.0)
        .with_route("10 First St", "30 Third Rd", 25.0);
    let harness = Harness::new(provider, SchedulingPolicy::default());
    harness.bookings.insert(booking("a", "t1", local(3, 12, 0), 2.0, "10 First St"));
    harness.bookings.insert(booking("c", "t1", local(3, 17, 0), 1.0, "30 Third Rd"));
    let engine = harness.availability();

    let first = engine.get_available_days(&tuesday_request(14, 30, "20 Second Ave")).await.unwrap();
    assert!(first[0].available);
    let calls_after_first = harness.provider.calls();
    assert!(calls_after_first > 0);

    let second = engine.get_available_days(&tuesday_request(14, 40, "20 Second Ave")).await.unwrap();
    assert!(second[0].available);
    assert_eq!(harness.provider.calls(), calls_after_first);
}

#[tokio::test]
async fn test_without_location_travel_is_not_checked() {
    let harness = drive_limit_harness();
    let request = AvailabilityRequest::new(date(3), date(3), time(12, 0), 1.0);
    let days = harness.availability().get_available_days(&request).await.unwrap();

    assert!(days[0].available);
    assert_eq!(days[0].travel_minutes, None);
    assert_eq!(harness.provider.calls(), 0);
}

#[tokio::test]
async fn test_technician_filter_ignores_other_schedules() {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    harness.bookings.insert(booking("a", "t2", local(3, 9, 0), 1.0, "1 Main St"));

    let request = AvailabilityRequest::new(date(3), date(3), time(9, 0), 1.0)
        .with_technician("t1".into());
    assert!(harness.availability().get_available_days(&request).await.unwrap()[0].available);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let harness = Harness::new(TableProvider::new(), SchedulingPolicy::default());
    let engine = harness.availability();

    let reversed = AvailabilityRequest::new(date(5), date(3), time(9, 0), 1.0);
    assert!(matches!(
        engine.get_available_days(&reversed).await,
        Err(FieldopsError::InvalidDateRange { .. })
    ));

    let too_long = AvailabilityRequest::new(date(1), date(1) + chrono::Duration::days(62), time(9, 0), 1.0);
    assert!(matches!(
        engine.get_available_days(&too_long).await,
        Err(FieldopsError::InvalidDateRange { .. })
    ));

    let zero = AvailabilityRequest::new(date(3), date(3), time(9, 0), 0.0);
    assert!(matches!(
        engine.get_available_days(&zero).await,
        Err(FieldopsError::InvalidRequest { .. })
    ));

    for hours in [24.5, 1e10] {
        let huge = AvailabilityRequest::new(date(3), date(3), time(9, 0), hours);
        assert!(matches!(
            engine.get_available_days(&huge).await,
            Err(FieldopsError::InvalidRequest { .. })
        ));
    }

    let full_day = AvailabilityRequest::new(date(3), date(3), time(9, 0), 24.0);
    assert!(engine.get_available_days(&full_day).await.is_ok());

    let blank = tuesday_request(9, 0, "   ");
    assert!(matches!(
        engine.get_available_days(&blank).await,
        Err(FieldopsError::InvalidAddress { .. })
    ));
}
