use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::models::{
    Booking, CacheKey, DueItem, InsightDraft, InsightFilter, InsightId, InsightRunLog,
    InsightStatus, ScheduleInsight, TechnicianId, TravelCacheEntry,
};

/// Port for the external booking record store
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Bookings starting in [start, end), optionally limited to one technician
    async fn find_bookings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        technician: Option<&TechnicianId>,
    ) -> Result<Vec<Booking>>;

    /// Due-but-unscheduled work with a due date in [start, end]
    async fn find_due_unscheduled_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DueItem>>;
}

/// Port for persistent travel-pair cache storage
#[async_trait]
pub trait TravelCacheStore: Send + Sync {
    /// Fetch entries for the given keys; absent keys are simply missing
    async fn find_by_hashes(&self, keys: &[CacheKey]) -> Result<Vec<TravelCacheEntry>>;

    /// Insert or replace entries by key
    async fn bulk_upsert(&self, entries: &[TravelCacheEntry]) -> Result<()>;

    /// Delete entries that expired before `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Port for schedule insight persistence
#[async_trait]
pub trait InsightStore: Send + Sync {
    /// Create an open insight for the draft's fingerprint, or refresh the existing open one
    ///
    /// Implementations must make this atomic so concurrent runs cannot create
    /// two open insights with the same fingerprint.
    async fn upsert_open(&self, draft: &InsightDraft, now: DateTime<Utc>) -> Result<ScheduleInsight>;

    /// Get an insight by ID
    async fn get(&self, id: InsightId) -> Result<Option<ScheduleInsight>>;

    /// List insights matching a filter, newest first
    async fn list(&self, filter: &InsightFilter) -> Result<Vec<ScheduleInsight>>;

    /// Move an open insight to resolved or dismissed
    async fn transition(
        &self,
        id: InsightId,
        status: InsightStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ScheduleInsight>;

    /// Open insights dated inside [from, to], optionally for one technician
    async fn list_open_in_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        technician: Option<&TechnicianId>,
    ) -> Result<Vec<ScheduleInsight>> {
        let mut filter = InsightFilter::new().with_status(InsightStatus::Open).with_window(from, to);
        filter.technician_id = technician.cloned();
        self.list(&filter).await
    }

    /// Dismiss the given open insights with a note, returning how many changed
    ///
    /// Insights that were closed concurrently are skipped.
    async fn dismiss_stale(&self, ids: &[InsightId], note: &str, now: DateTime<Utc>) -> Result<usize> {
        let mut dismissed = 0;
        for id in ids {
            match self.transition(*id, InsightStatus::Dismissed, Some(note.to_string()), now).await {
                Ok(_) => dismissed += 1,
                Err(FieldopsError::InvalidTransition { .. } | FieldopsError::InsightNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(dismissed)
    }
}

/// Port for the append-only analysis run log
#[async_trait]
pub trait RunLogStore: Send + Sync {
    /// Append a run record
    async fn append(&self, log: &InsightRunLog) -> Result<()>;

    /// Most recent runs, newest first
    async fn list_recent(&self, limit: usize) -> Result<Vec<InsightRunLog>>;
}
