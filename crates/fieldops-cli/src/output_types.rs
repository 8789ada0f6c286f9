use chrono::Datelike;
use fieldops_core::config::ConfigSource;
use fieldops_core::models::{DayAvailability, InsightRunLog, ScheduleInsight};
use serde::Serialize;
use tabled::Tabled;

/// Output for the availability command
#[derive(Debug, Serialize)]
pub struct AvailabilityOutput {
    pub days: Vec<DayAvailability>,
    pub available_count: usize,
}

/// Output for a resolved configuration value
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: ConfigSource,
}

/// Output for the normalize command
#[derive(Debug, Serialize)]
pub struct NormalizedAddress {
    pub input: String,
    pub normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Tabled)]
pub struct DayRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Day")]
    pub weekday: String,
    #[tabled(rename = "Available")]
    pub available: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[tabled(rename = "Travel (min)")]
    pub travel: String,
}

impl From<&DayAvailability> for DayRow {
    fn from(day: &DayAvailability) -> Self {
        Self {
            date: day.date.to_string(),
            weekday: day.date.weekday().to_string(),
            available: if day.available { "✓" } else { "✗" }.to_string(),
            reason: day.reason.map(|r| r.to_string()).unwrap_or_default(),
            travel: day.travel_minutes.map(|m| format!("{:.0}", m)).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct InsightRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Technician")]
    pub technician: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Title")]
    pub title: String,
}

impl From<&ScheduleInsight> for InsightRow {
    fn from(insight: &ScheduleInsight) -> Self {
        Self {
            id: insight.id.to_string(),
            severity: insight.severity.to_string(),
            kind: insight.kind.to_string(),
            date: insight.date_key.map(|d| d.to_string()).unwrap_or_default(),
            technician: insight
                .technician_id
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: insight.status.to_string(),
            title: insight.title.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct RunRow {
    #[tabled(rename = "Started")]
    pub started: String,
    #[tabled(rename = "Trigger")]
    pub trigger: String,
    #[tabled(rename = "Window")]
    pub window: String,
    #[tabled(rename = "Generated")]
    pub generated: usize,
    #[tabled(rename = "Dismissed")]
    pub dismissed: usize,
    #[tabled(rename = "Took (ms)")]
    pub duration_ms: u64,
}

impl From<&InsightRunLog> for RunRow {
    fn from(run: &InsightRunLog) -> Self {
        Self {
            started: run.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            trigger: run.trigger.to_string(),
            window: format!("{} .. {}", run.date_from, run.date_to),
            generated: run.generated_count,
            dismissed: run.dismissed_count,
            duration_ms: run.duration_ms,
        }
    }
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

#[derive(Tabled)]
pub struct NormalizeRow {
    #[tabled(rename = "Input")]
    pub input: String,
    #[tabled(rename = "Normalized")]
    pub normalized: String,
}
