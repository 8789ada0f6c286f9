//! Service-day arithmetic in the business time zone
//!
//! Jobs starting between midnight and the cutoff hour belong to the tail of
//! the previous service day for ordering and routing. Calendar grouping and
//! stored dates are never shifted.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Hour before which a job counts as the tail of the previous service day
pub const SERVICE_DAY_CUTOFF_HOUR: u32 = 3;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Ordering key for a job within the service-day sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceDayKey {
    /// Service day the job belongs to
    pub date: NaiveDate,

    /// Minutes since the service day's midnight; past 1440 for post-midnight tails
    pub sort_minutes: u32,
}

/// Compute the service-day ordering key of an instant
pub fn service_day_ordering_key(instant: DateTime<Utc>, tz: Tz, cutoff_hour: u32) -> ServiceDayKey {
    let local = instant.with_timezone(&tz);
    let minutes = local.hour() * 60 + local.minute();

    if local.hour() < cutoff_hour {
        let date = local.date_naive().pred_opt().unwrap_or(local.date_naive());
        ServiceDayKey { date, sort_minutes: minutes + MINUTES_PER_DAY }
    } else {
        ServiceDayKey { date: local.date_naive(), sort_minutes: minutes }
    }
}

/// Calendar date of an instant in the business time zone
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Local hour of an instant in the business time zone
pub fn local_hour(instant: DateTime<Utc>, tz: Tz) -> u32 {
    instant.with_timezone(&tz).hour()
}

/// Resolve a local wall-clock date and time to an instant
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are pushed forward by the gap.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = NaiveDateTime::new(date, time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// UTC bounds [start, end) of a local calendar day
pub fn day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_to_utc(date, NaiveTime::MIN, tz);
    let next = date.succ_opt().unwrap_or(date);
    let end = local_to_utc(next, NaiveTime::MIN, tz);
    (start, end)
}

/// Iterate the inclusive range of calendar days
pub fn days_in_range(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ: Tz = chrono_tz::America::Toronto;

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> DateTime<Utc> {
        local_to_utc(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            TZ,
        )
    }

    #[test]
    fn test_daytime_job_keeps_its_date() {
        let key = service_day_ordering_key(at((2026, 3, 3), 14, 30), TZ, SERVICE_DAY_CUTOFF_HOUR);
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(key.sort_minutes, 14 * 60 + 30);
    }

    #[test]
    fn test_early_morning_job_is_tail_of_previous_day() {
        let key = service_day_ordering_key(at((2026, 3, 4), 1, 15), TZ, SERVICE_DAY_CUTOFF_HOUR);
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(key.sort_minutes, 24 * 60 + 75);
    }

    #[test]
    fn test_post_midnight_sorts_after_evening() {
        let evening = service_day_ordering_key(at((2026, 3, 3), 23, 0), TZ, 3);
        let after_midnight = service_day_ordering_key(at((2026, 3, 4), 0, 30), TZ, 3);
        let next_morning = service_day_ordering_key(at((2026, 3, 4), 8, 0), TZ, 3);
        assert!(evening < after_midnight);
        assert!(after_midnight < next_morning);
    }

    #[test]
    fn test_cutoff_hour_itself_is_new_day() {
        let key = service_day_ordering_key(at((2026, 3, 4), 3, 0), TZ, 3);
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(key.sort_minutes, 180);
    }

    #[test]
    fn test_day_bounds_cover_local_day() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 14).unwrap();
        let (start, end) = day_bounds(date, TZ);
        assert_eq!(end - start, Duration::hours(24));
        assert_eq!(local_date(start, TZ), date);
        assert_eq!(local_date(end - Duration::seconds(1), TZ), date);
    }

    #[test]
    fn test_days_in_range_is_inclusive() {
        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert_eq!(days_in_range(from, to).count(), 3);
        assert_eq!(days_in_range(to, from).count(), 0);
    }
}
