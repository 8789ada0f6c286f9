use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::booking::{BookingId, TechnicianId};
use crate::error::FieldopsError;

/// Unique identifier for a persisted insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightId(pub Uuid);

impl InsightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InsightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InsightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for InsightId {
    type Err = FieldopsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(InsightId).map_err(|e| FieldopsError::InvalidRequest {
            field: "insight_id".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Declares a string-backed enum with `as_str`, `Display`, and `FromStr`
macro_rules! string_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FieldopsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().replace('-', "_").as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(FieldopsError::InvalidRequest {
                        field: $field.to_string(),
                        reason: format!("unknown value '{}'", other),
                    }),
                }
            }
        }
    };
}

/// Kind of schedule risk an insight describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    TravelOverload,
    RestGap,
    DayBoundaryRisk,
    RouteInefficiency,
    DueSoonUnscheduled,
}

string_enum!(InsightKind, "kind", {
    TravelOverload => "travel_overload",
    RestGap => "rest_gap",
    DayBoundaryRisk => "day_boundary_risk",
    RouteInefficiency => "route_inefficiency",
    DueSoonUnscheduled => "due_soon_unscheduled",
});

impl InsightKind {
    /// Every kind the analyzer produces
    pub const ALL: [InsightKind; 5] = [
        InsightKind::TravelOverload,
        InsightKind::RestGap,
        InsightKind::DayBoundaryRisk,
        InsightKind::RouteInefficiency,
        InsightKind::DueSoonUnscheduled,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

string_enum!(Severity, "severity", {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

/// Lifecycle state of a persisted insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    Open,
    Resolved,
    Dismissed,
}

string_enum!(InsightStatus, "status", {
    Open => "open",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

impl InsightStatus {
    /// Only open insights may transition, and only to a closed state
    pub fn can_transition_to(&self, next: InsightStatus) -> bool {
        matches!(
            (self, next),
            (InsightStatus::Open, InsightStatus::Resolved)
                | (InsightStatus::Open, InsightStatus::Dismissed)
        )
    }
}

/// Whether an insight came from rules alone or was refined by the enhancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Rule,
    Hybrid,
}

string_enum!(InsightSource, "source", {
    Rule => "rule",
    Hybrid => "hybrid",
});

/// What started an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Manual,
    Scheduled,
    BookingChange,
    Api,
}

string_enum!(RunTrigger, "trigger", {
    Manual => "manual",
    Scheduled => "scheduled",
    BookingChange => "booking_change",
    Api => "api",
});

/// A finding produced by the analyzer before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightDraft {
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub date_key: Option<NaiveDate>,
    pub technician_id: Option<TechnicianId>,
    #[serde(default)]
    pub booking_ids: Vec<BookingId>,
    pub fingerprint: String,
    pub source: InsightSource,
    pub confidence: f64,
}

/// A persisted insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInsight {
    pub id: InsightId,
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub date_key: Option<NaiveDate>,
    pub technician_id: Option<TechnicianId>,
    pub booking_ids: Vec<BookingId>,
    pub fingerprint: String,
    pub status: InsightStatus,
    pub source: InsightSource,
    pub confidence: f64,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ScheduleInsight {
    /// Create a new open insight from a draft
    pub fn from_draft(draft: &InsightDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: InsightId::new(),
            kind: draft.kind,
            severity: draft.severity,
            title: draft.title.clone(),
            message: draft.message.clone(),
            date_key: draft.date_key,
            technician_id: draft.technician_id.clone(),
            booking_ids: draft.booking_ids.clone(),
            fingerprint: draft.fingerprint.clone(),
            status: InsightStatus::Open,
            source: draft.source,
            confidence: draft.confidence,
            resolution_note: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Overwrite the descriptive fields from a re-generated draft
    pub fn refresh_from(&mut self, draft: &InsightDraft, now: DateTime<Utc>) {
        self.severity = draft.severity;
        self.title = draft.title.clone();
        self.message = draft.message.clone();
        self.date_key = draft.date_key;
        self.technician_id = draft.technician_id.clone();
        self.booking_ids = draft.booking_ids.clone();
        self.source = draft.source;
        self.confidence = draft.confidence;
        self.updated_at = now;
    }
}

/// Filter for listing insights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightFilter {
    pub status: Option<InsightStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub technician_id: Option<TechnicianId>,
    pub kind: Option<InsightKind>,
}

impl InsightFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: InsightStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_window(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn with_technician(mut self, technician: TechnicianId) -> Self {
        self.technician_id = Some(technician);
        self
    }

    pub fn with_kind(mut self, kind: InsightKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Check if an insight matches this filter
    ///
    /// Insights without a date key only match filters without a window.
    pub fn matches(&self, insight: &ScheduleInsight) -> bool {
        if self.status.is_some_and(|s| s != insight.status) {
            return false;
        }
        if self.kind.is_some_and(|k| k != insight.kind) {
            return false;
        }
        if let Some(ref technician) = self.technician_id {
            if insight.technician_id.as_ref() != Some(technician) {
                return false;
            }
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = insight.date_key else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }
        true
    }
}

/// Append-only record of one analysis invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRunLog {
    pub id: Uuid,
    pub trigger: RunTrigger,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub technician_id: Option<TechnicianId>,
    pub generated_count: usize,
    pub dismissed_count: usize,
    pub enhanced: bool,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}
