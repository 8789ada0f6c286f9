//! Schedule insight analyzer
//!
//! Turns a window of bookings into deduplicated, lifecycle-tracked findings.
//! Every finding carries a fingerprint over its identifying facts; re-running
//! over an unchanged schedule refreshes the same open insights, and findings
//! that are no longer reproduced are dismissed automatically.

use chrono::{Duration, NaiveDate};
use fieldops_core::clock::Clock;
use fieldops_core::error::{FieldopsError, Result};
use fieldops_core::fingerprint::{bucket, fingerprint};
use fieldops_core::models::{
    Booking, BookingId, DayTravelSummary, DueItem, InsightDraft, InsightFilter, InsightId,
    InsightKind, InsightRunLog, InsightSource, InsightStatus, RunTrigger, ScheduleInsight, Severity,
    TechnicianId, TravelPair,
};
use fieldops_core::service_day::{day_bounds, local_date, local_hour};
use fieldops_core::{InsightThresholds, SchedulingPolicy};
use fieldops_geo::{build_segments, sort_by_service_day, summarize, Segment};
use fieldops_llm::InsightEnhancer;
use fieldops_store::ports::{BookingStore, InsightStore, RunLogStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::estimator::RouteEstimator;

/// Note attached to insights closed because their condition went away
pub const AUTO_DISMISS_NOTE: &str = "Auto-dismissed: condition no longer detected";

/// Metric bucket widths used in fingerprints
const TRAVEL_BUCKET_MINUTES: f64 = 15.0;
const REST_BUCKET_MINUTES: f64 = 30.0;

/// Window and scope of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
    #[serde(default = "default_trigger")]
    pub trigger: RunTrigger,
}

fn default_trigger() -> RunTrigger {
    RunTrigger::Manual
}

impl AnalysisRequest {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self { date_from, date_to, technician_id: None, trigger: RunTrigger::Manual }
    }

    pub fn with_technician(mut self, technician: TechnicianId) -> Self {
        self.technician_id = Some(technician);
        self
    }

    pub fn with_trigger(mut self, trigger: RunTrigger) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Drafts produced by the rules
    pub generated: usize,

    /// Open insights after upsert, one per generated fingerprint
    pub insights: Vec<ScheduleInsight>,

    /// Open insights closed because their finding was not reproduced
    pub dismissed: usize,

    /// Whether the enhancer refined at least one draft
    pub enhanced: bool,

    pub run_log: InsightRunLog,
}

/// One technician's bookings on one calendar date
struct TechnicianDay {
    technician: Option<TechnicianId>,
    date: NaiveDate,
    jobs: Vec<Booking>,
    segments: Vec<Segment>,
}

impl TechnicianDay {
    fn booking_ids(&self) -> Vec<BookingId> {
        self.jobs.iter().map(|j| j.id.clone()).collect()
    }

    fn work_minutes(&self) -> f64 {
        self.jobs.iter().map(|j| j.effective_duration_hours() * 60.0).sum()
    }
}

/// Produces and maintains schedule insights
pub struct InsightAnalyzer {
    bookings: Arc<dyn BookingStore>,
    insights: Arc<dyn InsightStore>,
    run_logs: Arc<dyn RunLogStore>,
    estimator: Arc<RouteEstimator>,
    enhancer: Option<Arc<dyn InsightEnhancer>>,
    policy: SchedulingPolicy,
    thresholds: InsightThresholds,
    clock: Arc<dyn Clock>,
}

impl InsightAnalyzer {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        insights: Arc<dyn InsightStore>,
        run_logs: Arc<dyn RunLogStore>,
        estimator: Arc<RouteEstimator>,
        policy: SchedulingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            insights,
            run_logs,
            estimator,
            enhancer: None,
            policy,
            thresholds: InsightThresholds::default(),
            clock,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn InsightEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Run the rules over a window and reconcile the stored insights
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let timer = Instant::now();
        let started_at = self.clock.now();
        self.validate(request)?;

        let days = self.load_days(request).await?;
        let in_window: Vec<&TechnicianDay> =
            days.iter().filter(|d| d.date >= request.date_from).collect();
        let pairs: Vec<TravelPair> =
            in_window.iter().flat_map(|d| d.segments.iter().map(Segment::to_pair)).collect();
        let lookup = self.estimator.resolve(&pairs).await?;

        let mut drafts = Vec::new();
        for day in in_window {
            let summary = summarize(&day.segments, |s| lookup.get(&s.to_pair()));
            drafts.extend(self.travel_drafts(day, &summary));
            drafts.extend(self.boundary_drafts(day));
        }
        drafts.extend(self.rest_gap_drafts(&days));
        drafts.extend(self.due_soon_drafts(request).await?);

        let generated = drafts.len();
        let (drafts, enhanced) = self.enhance(drafts).await;

        let now = self.clock.now();
        let mut upserted = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            upserted.push(self.insights.upsert_open(draft, now).await?);
        }

        let produced: HashSet<&str> = drafts.iter().map(|d| d.fingerprint.as_str()).collect();
        let stale: Vec<InsightId> = self
            .insights
            .list_open_in_window(request.date_from, request.date_to, request.technician_id.as_ref())
            .await?
            .into_iter()
            .filter(|i| InsightKind::ALL.contains(&i.kind))
            .filter(|i| !produced.contains(i.fingerprint.as_str()))
            .map(|i| i.id)
            .collect();
        let dismissed = self.insights.dismiss_stale(&stale, AUTO_DISMISS_NOTE, now).await?;

        let run_log = InsightRunLog {
            id: Uuid::new_v4(),
            trigger: request.trigger,
            date_from: request.date_from,
            date_to: request.date_to,
            technician_id: request.technician_id.clone(),
            generated_count: generated,
            dismissed_count: dismissed,
            enhanced,
            duration_ms: timer.elapsed().as_millis() as u64,
            started_at,
        };
        self.run_logs.append(&run_log).await?;

        tracing::info!(
            from = %request.date_from,
            to = %request.date_to,
            trigger = %request.trigger,
            generated,
            dismissed,
            enhanced,
            "Schedule analysis complete"
        );

        Ok(AnalysisReport { generated, insights: upserted, dismissed, enhanced, run_log })
    }

    /// Mark an open insight as resolved
    pub async fn resolve(&self, id: InsightId, note: Option<String>) -> Result<ScheduleInsight> {
        self.insights.transition(id, InsightStatus::Resolved, note, self.clock.now()).await
    }

    /// Mark an open insight as dismissed
    pub async fn dismiss(&self, id: InsightId, note: Option<String>) -> Result<ScheduleInsight> {
        self.insights.transition(id, InsightStatus::Dismissed, note, self.clock.now()).await
    }

    pub async fn get(&self, id: InsightId) -> Result<ScheduleInsight> {
        self.insights
            .get(id)
            .await?
            .ok_or_else(|| FieldopsError::InsightNotFound { id: id.to_string() })
    }

    pub async fn list(&self, filter: &InsightFilter) -> Result<Vec<ScheduleInsight>> {
        self.insights.list(filter).await
    }

    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<InsightRunLog>> {
        self.run_logs.list_recent(limit).await
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<()> {
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
        Ok(())
    }

    /// Fetch the window and group it per technician per calendar date
    ///
    /// The day before the window is loaded too, so a short rest ending on the
    /// first day is still seen. Only rest gaps look at that extra day.
    async fn load_days(&self, request: &AnalysisRequest) -> Result<Vec<TechnicianDay>> {
        let tz = self.policy.timezone;
        let lookback = request.date_from.pred_opt().unwrap_or(request.date_from);
        let (start, _) = day_bounds(lookback, tz);
        let (_, end) = day_bounds(request.date_to, tz);
        let bookings = self
            .bookings
            .find_bookings_in_range(start, end, request.technician_id.as_ref())
            .await?;

        let mut groups: BTreeMap<(Option<TechnicianId>, NaiveDate), Vec<Booking>> = BTreeMap::new();
        for booking in bookings {
            let date = local_date(booking.start, tz);
            let technicians: Vec<Option<TechnicianId>> = match &request.technician_id {
                Some(filter) => vec![Some(filter.clone())],
                None if booking.technician_ids.is_empty() => vec![None],
                None => booking.technician_ids.iter().cloned().map(Some).collect(),
            };
            for technician in technicians {
                groups.entry((technician, date)).or_default().push(booking.clone());
            }
        }

        Ok(groups
            .into_iter()
            .map(|((technician, date), mut jobs)| {
                sort_by_service_day(&mut jobs, tz, self.policy.service_day_cutoff_hour);
                let segments = build_segments(
                    &jobs,
                    self.policy.depot_address.as_deref(),
                    self.policy.depot_return_gap(),
                );
                TechnicianDay { technician, date, jobs, segments }
            })
            .collect())
    }

    fn travel_drafts(&self, day: &TechnicianDay, summary: &DayTravelSummary) -> Vec<InsightDraft> {
        let mut drafts = Vec::new();
        let t = &self.thresholds;
        let who = describe(&day.technician);
        let confidence = if summary.is_complete() { 0.9 } else { 0.6 };

        if summary.total_minutes > t.travel_warning_minutes {
            let severity = if summary.total_minutes > t.travel_critical_minutes {
                Severity::Critical
            } else {
                Severity::Warning
            };
            drafts.push(self.draft(
                InsightKind::TravelOverload,
                severity,
                format!("Heavy driving on {}", day.date),
                format!(
                    "{} has {:.0} minutes of driving across {} legs on {}.",
                    who, summary.total_minutes, summary.segment_count, day.date
                ),
                Some(day.date),
                day.technician.clone(),
                day.booking_ids(),
                confidence,
                json!({
                    "technician": day.technician,
                    "date": day.date,
                    "travel_bucket": bucket(summary.total_minutes, TRAVEL_BUCKET_MINUTES),
                }),
            ));
        }

        let work = day.work_minutes();
        if work > 0.0
            && summary.total_minutes >= t.inefficiency_min_travel_minutes
            && summary.total_minutes / work >= t.inefficiency_ratio
        {
            drafts.push(self.draft(
                InsightKind::RouteInefficiency,
                Severity::Warning,
                format!("Inefficient route on {}", day.date),
                format!(
                    "{} drives {:.0} minutes for {:.0} minutes of work on {} ({:.0}% of work time).",
                    who,
                    summary.total_minutes,
                    work,
                    day.date,
                    summary.total_minutes / work * 100.0
                ),
                Some(day.date),
                day.technician.clone(),
                day.booking_ids(),
                confidence,
                json!({
                    "technician": day.technician,
                    "date": day.date,
                    "travel_bucket": bucket(summary.total_minutes, TRAVEL_BUCKET_MINUTES),
                    "work_bucket": bucket(work, TRAVEL_BUCKET_MINUTES),
                }),
            ));
        }

        drafts
    }

    fn boundary_drafts(&self, day: &TechnicianDay) -> Vec<InsightDraft> {
        let tz = self.policy.timezone;
        let cutoff = self.policy.service_day_cutoff_hour;

        day.jobs
            .iter()
            .filter(|job| local_hour(job.start, tz) < cutoff)
            .map(|job| {
                self.draft(
                    InsightKind::DayBoundaryRisk,
                    Severity::Warning,
                    format!("Job before {:02}:00 on {}", cutoff, day.date),
                    format!(
                        "Booking {} for {} starts at {} local time, inside the previous service day.",
                        job.id,
                        describe(&day.technician),
                        job.start.with_timezone(&tz).format("%H:%M")
                    ),
                    Some(day.date),
                    day.technician.clone(),
                    vec![job.id.clone()],
                    0.9,
                    json!({
                        "technician": day.technician,
                        "date": day.date,
                        "booking": job.id,
                    }),
                )
            })
            .collect()
    }

    /// Short overnight rests between consecutive calendar days
    fn rest_gap_drafts(&self, days: &[TechnicianDay]) -> Vec<InsightDraft> {
        let t = &self.thresholds;
        let mut drafts = Vec::new();

        // Days are ordered by (technician, date), so neighbors share a technician
        for pair in days.windows(2) {
            let (today, tomorrow) = (&pair[0], &pair[1]);
            if today.technician != tomorrow.technician || today.date.succ_opt() != Some(tomorrow.date) {
                continue;
            }

            let (Some(last), Some(first)) = (
                today.jobs.iter().max_by_key(|j| j.travel_end()),
                tomorrow.jobs.iter().min_by_key(|j| j.start),
            ) else {
                continue;
            };

            let gap = first.start - last.travel_end();
            let gap_hours = gap.num_minutes() as f64 / 60.0;
            if gap >= hours(t.rest_warning_hours) {
                continue;
            }
            let severity = if gap < hours(t.rest_critical_hours) {
                Severity::Critical
            } else {
                Severity::Warning
            };

            drafts.push(self.draft(
                InsightKind::RestGap,
                severity,
                format!("Short rest before {}", tomorrow.date),
                format!(
                    "{} has only {:.1} hours between booking {} and booking {}.",
                    describe(&today.technician),
                    gap_hours.max(0.0),
                    last.id,
                    first.id
                ),
                Some(tomorrow.date),
                tomorrow.technician.clone(),
                vec![last.id.clone(), first.id.clone()],
                0.95,
                json!({
                    "technician": tomorrow.technician,
                    "date": tomorrow.date,
                    "bookings": [last.id, first.id],
                    "gap_bucket": bucket(gap.num_minutes() as f64, REST_BUCKET_MINUTES),
                }),
            ));
        }

        drafts
    }

    async fn due_soon_drafts(&self, request: &AnalysisRequest) -> Result<Vec<InsightDraft>> {
        let items = self
            .bookings
            .find_due_unscheduled_in_range(request.date_from, request.date_to)
            .await?;
        let today = local_date(self.clock.now(), self.policy.timezone);

        Ok(items
            .into_iter()
            .filter(|item| match &request.technician_id {
                Some(filter) => item.technician_id.as_ref() == Some(filter),
                None => true,
            })
            .map(|item| self.due_draft(&item, today))
            .collect())
    }

    fn due_draft(&self, item: &DueItem, today: NaiveDate) -> InsightDraft {
        let days_left = (item.due_date - today).num_days();
        let severity = if days_left <= self.thresholds.due_critical_days {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let when = match days_left {
            d if d < 0 => format!("was due {} day(s) ago", -d),
            0 => "is due today".to_string(),
            1 => "is due tomorrow".to_string(),
            d => format!("is due in {} days", d),
        };

        self.draft(
            InsightKind::DueSoonUnscheduled,
            severity,
            format!("Unscheduled: {}", item.title),
            format!("{} {} ({}) and has no booking.", item.title, when, item.due_date),
            Some(item.due_date),
            item.technician_id.clone(),
            Vec::new(),
            0.9,
            json!({
                "item": item.id,
                "due_date": item.due_date,
            }),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn draft(
        &self,
        kind: InsightKind,
        severity: Severity,
        title: String,
        message: String,
        date_key: Option<NaiveDate>,
        technician_id: Option<TechnicianId>,
        booking_ids: Vec<BookingId>,
        confidence: f64,
        mut facts: serde_json::Value,
    ) -> InsightDraft {
        facts["kind"] = json!(kind.as_str());
        InsightDraft {
            kind,
            severity,
            title,
            message,
            date_key,
            technician_id,
            booking_ids,
            fingerprint: fingerprint(&facts),
            source: InsightSource::Rule,
            confidence,
        }
    }

    async fn enhance(&self, drafts: Vec<InsightDraft>) -> (Vec<InsightDraft>, bool) {
        let Some(enhancer) = &self.enhancer else {
            return (drafts, false);
        };
        if drafts.is_empty() {
            return (drafts, false);
        }

        let originals: Vec<(InsightKind, Severity, String)> =
            drafts.iter().map(|d| (d.kind, d.severity, d.fingerprint.clone())).collect();
        let refined = enhancer.enhance(drafts.clone()).await;

        // Identity must survive enhancement
        let intact = refined.len() == originals.len()
            && refined
                .iter()
                .zip(&originals)
                .all(|(d, (kind, severity, fp))| {
                    d.kind == *kind && d.severity == *severity && d.fingerprint == *fp
                });
        if !intact {
            tracing::warn!(enhancer = enhancer.name(), "Enhancer changed insight identity; using rule output");
            return (drafts, false);
        }

        let enhanced = refined.iter().any(|d| d.source == InsightSource::Hybrid);
        (refined, enhanced)
    }
}

fn describe(technician: &Option<TechnicianId>) -> String {
    match technician {
        Some(id) => format!("Technician {}", id),
        None => "Unassigned work".to_string(),
    }
}

fn hours(value: f64) -> Duration {
    Duration::minutes((value * 60.0).round() as i64)
}

