//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For production workloads, use the PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::models::{
    Booking, BookingId, CacheKey, DueItem, InsightDraft, InsightFilter, InsightId, InsightRunLog,
    InsightStatus, ScheduleInsight, TechnicianId, TravelCacheEntry,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ports::{BookingStore, InsightStore, RunLogStore, TravelCacheStore};

/// In-memory implementation of BookingStore
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    due_items: Arc<RwLock<Vec<DueItem>>>,
}

impl MemoryBookingStore {
    /// Create a new in-memory booking store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with bookings and due items
    pub fn with_data(bookings: Vec<Booking>, due_items: Vec<DueItem>) -> Self {
        let store = Self::new();
        for booking in bookings {
            store.insert(booking);
        }
        *store.due_items.write().unwrap() = due_items;
        store
    }

    /// Insert or replace a booking
    pub fn insert(&self, booking: Booking) {
        self.bookings.write().unwrap().insert(booking.id.clone(), booking);
    }

    /// Remove a booking, returning it if present
    pub fn remove(&self, id: &BookingId) -> Option<Booking> {
        self.bookings.write().unwrap().remove(id)
    }

    /// Add a due-but-unscheduled work item
    pub fn add_due_item(&self, item: DueItem) {
        self.due_items.write().unwrap().push(item);
    }

    /// Number of stored bookings
    pub fn len(&self) -> usize {
        self.bookings.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn find_bookings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        technician: Option<&TechnicianId>,
    ) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().unwrap();
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| b.start >= start && b.start < end)
            .filter(|b| technician.map_or(true, |t| b.is_assigned_to(t)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_due_unscheduled_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DueItem>> {
        let items = self.due_items.read().unwrap();
        Ok(items.iter().filter(|i| i.due_date >= start && i.due_date <= end).cloned().collect())
    }
}

/// In-memory implementation of TravelCacheStore
#[derive(Debug, Clone, Default)]
pub struct MemoryTravelCacheStore {
    entries: Arc<RwLock<HashMap<CacheKey, TravelCacheEntry>>>,
}

impl MemoryTravelCacheStore {
    /// Create a new in-memory travel cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TravelCacheStore for MemoryTravelCacheStore {
    async fn find_by_hashes(&self, keys: &[CacheKey]) -> Result<Vec<TravelCacheEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(keys.iter().filter_map(|k| entries.get(k).cloned()).collect())
    }

    async fn bulk_upsert(&self, entries: &[TravelCacheEntry]) -> Result<()> {
        let mut store = self.entries.write().unwrap();
        for entry in entries {
            store.insert(entry.key.clone(), entry.clone());
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut store = self.entries.write().unwrap();
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        Ok(before - store.len())
    }
}

/// In-memory implementation of InsightStore
#[derive(Debug, Clone, Default)]
pub struct MemoryInsightStore {
    insights: Arc<RwLock<HashMap<InsightId, ScheduleInsight>>>,
}

impl MemoryInsightStore {
    /// Create a new in-memory insight store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InsightStore for MemoryInsightStore {
    async fn upsert_open(&self, draft: &InsightDraft, now: DateTime<Utc>) -> Result<ScheduleInsight> {
        // Single write lock makes find-then-insert atomic
        let mut insights = self.insights.write().unwrap();

        let existing = insights
            .values_mut()
            .find(|i| i.status == InsightStatus::Open && i.fingerprint == draft.fingerprint);

        if let Some(insight) = existing {
            insight.refresh_from(draft, now);
            return Ok(insight.clone());
        }

        let insight = ScheduleInsight::from_draft(draft, now);
        insights.insert(insight.id, insight.clone());
        Ok(insight)
    }

    async fn get(&self, id: InsightId) -> Result<Option<ScheduleInsight>> {
        let insights = self.insights.read().unwrap();
        Ok(insights.get(&id).cloned())
    }

    async fn list(&self, filter: &InsightFilter) -> Result<Vec<ScheduleInsight>> {
        let insights = self.insights.read().unwrap();
        let mut found: Vec<ScheduleInsight> =
            insights.values().filter(|i| filter.matches(i)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.title.cmp(&b.title)));
        Ok(found)
    }

    async fn transition(
        &self,
        id: InsightId,
        status: InsightStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ScheduleInsight> {
        let mut insights = self.insights.write().unwrap();
        let insight = insights
            .get_mut(&id)
            .ok_or_else(|| FieldopsError::InsightNotFound { id: id.to_string() })?;

        if !insight.status.can_transition_to(status) {
            return Err(FieldopsError::InvalidTransition {
                id: id.to_string(),
                from: insight.status.to_string(),
                to: status.to_string(),
            });
        }

        insight.status = status;
        insight.resolution_note = note;
        insight.updated_at = now;
        insight.resolved_at = Some(now);
        Ok(insight.clone())
    }
}

/// In-memory implementation of RunLogStore
#[derive(Debug, Clone, Default)]
pub struct MemoryRunLogStore {
    logs: Arc<RwLock<Vec<InsightRunLog>>>,
}

impl MemoryRunLogStore {
    /// Create a new in-memory run log
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunLogStore for MemoryRunLogStore {
    async fn append(&self, log: &InsightRunLog) -> Result<()> {
        self.logs.write().unwrap().push(log.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<InsightRunLog>> {
        let logs = self.logs.read().unwrap();
        Ok(logs.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fieldops_core::models::{InsightKind, InsightSource, RunTrigger, Severity, TimeBucket, TravelEstimate};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn booking(id: &str, tech: &str, day: u32, hour: u32) -> Booking {
        Booking {
            id: BookingId::from(id),
            technician_ids: vec![TechnicianId::from(tech)],
            start: Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap(),
            duration_hours: 1.0,
            actual_duration_hours: None,
            historical_duration_hours: None,
            location: "1 Main St".to_string(),
        }
    }

    fn draft(fingerprint: &str, title: &str) -> InsightDraft {
        InsightDraft {
            kind: InsightKind::TravelOverload,
            severity: Severity::Warning,
            title: title.to_string(),
            message: "Too much driving".to_string(),
            date_key: NaiveDate::from_ymd_opt(2026, 3, 3),
            technician_id: Some(TechnicianId::from("t1")),
            booking_ids: vec![],
            fingerprint: fingerprint.to_string(),
            source: InsightSource::Rule,
            confidence: 0.8,
        }
    }

    fn cache_entry(key: &str, expires_in: Duration) -> TravelCacheEntry {
        TravelCacheEntry {
            key: CacheKey(key.to_string()),
            origin_normalized: "a".to_string(),
            destination_normalized: "b".to_string(),
            time_bucket: TimeBucket { weekday: 1, hour_bucket: 14 },
            estimate: TravelEstimate::new(12.0, 8.5),
            created_at: now(),
            expires_at: now() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_find_bookings_in_range_filters_by_technician() {
        let store = MemoryBookingStore::new();
        store.insert(booking("a", "t1", 3, 9));
        store.insert(booking("b", "t2", 3, 10));
        store.insert(booking("c", "t1", 5, 9));

        let start = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();

        let all = store.find_bookings_in_range(start, end, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let t1 = TechnicianId::from("t1");
        let mine = store.find_bookings_in_range(start, end, Some(&t1)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, BookingId::from("a"));
    }

    #[tokio::test]
    async fn test_travel_cache_upsert_replaces_by_key() {
        let store = MemoryTravelCacheStore::new();
        store.bulk_upsert(&[cache_entry("k1", Duration::days(90))]).await.unwrap();

        let mut replacement = cache_entry("k1", Duration::days(90));
        replacement.estimate = TravelEstimate::new(30.0, 20.0);
        store.bulk_upsert(&[replacement]).await.unwrap();

        assert_eq!(store.len(), 1);
        let found = store.find_by_hashes(&[CacheKey("k1".to_string())]).await.unwrap();
        assert_eq!(found[0].estimate.duration_minutes, 30.0);
    }

    #[tokio::test]
    async fn test_travel_cache_purge_expired() {
        let store = MemoryTravelCacheStore::new();
        store
            .bulk_upsert(&[
                cache_entry("fresh", Duration::days(1)),
                cache_entry("stale", Duration::days(-1)),
            ])
            .await
            .unwrap();

        assert_eq!(store.purge_expired(now()).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_open_reuses_fingerprint() {
        let store = MemoryInsightStore::new();
        let first = store.upsert_open(&draft("fp-1", "First"), now()).await.unwrap();
        let second = store
            .upsert_open(&draft("fp-1", "Second"), now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Second");
        assert_eq!(second.created_at, now());

        let all = store.list(&InsightFilter::new()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_after_dismissal_creates_new_open_insight() {
        let store = MemoryInsightStore::new();
        let first = store.upsert_open(&draft("fp-1", "First"), now()).await.unwrap();
        store.transition(first.id, InsightStatus::Dismissed, None, now()).await.unwrap();

        let again = store.upsert_open(&draft("fp-1", "Again"), now()).await.unwrap();
        assert_ne!(again.id, first.id);
        assert_eq!(again.status, InsightStatus::Open);
    }

    #[tokio::test]
    async fn test_transition_rules() {
        let store = MemoryInsightStore::new();
        let insight = store.upsert_open(&draft("fp-1", "First"), now()).await.unwrap();

        let resolved = store
            .transition(insight.id, InsightStatus::Resolved, Some("fixed".to_string()), now())
            .await
            .unwrap();
        assert_eq!(resolved.status, InsightStatus::Resolved);
        assert_eq!(resolved.resolution_note.as_deref(), Some("fixed"));

        let err = store
            .transition(insight.id, InsightStatus::Dismissed, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, FieldopsError::InvalidTransition { .. }));

        let missing = store
            .transition(InsightId(Uuid::new_v4()), InsightStatus::Resolved, None, now())
            .await
            .unwrap_err();
        assert!(matches!(missing, FieldopsError::InsightNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_log_lists_newest_first() {
        let store = MemoryRunLogStore::new();
        for count in 0..3 {
            store
                .append(&InsightRunLog {
                    id: Uuid::new_v4(),
                    trigger: RunTrigger::Manual,
                    date_from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    date_to: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
                    technician_id: None,
                    generated_count: count,
                    dismissed_count: 0,
                    enhanced: false,
                    duration_ms: 5,
                    started_at: now(),
                })
                .await
                .unwrap();
        }

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].generated_count, 2);
    }
}
