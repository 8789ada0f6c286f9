use chrono::{NaiveDate, NaiveTime};
use fieldops_core::error::FieldopsError;
use fieldops_core::models::{
    AvailabilityRequest, InsightFilter, InsightKind, InsightStatus, RunTrigger, TechnicianId,
};
use fieldops_scheduling::AnalysisRequest;
use serde::Deserialize;

use crate::error::ApiError;

/// Availability request body
#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,

    /// Local start time, "HH:MM" or "HH:MM:SS"
    pub time: String,
    pub duration_hours: f64,
    pub location: Option<String>,
    pub technician_id: Option<String>,
}

impl AvailabilityBody {
    pub fn into_request(self) -> Result<AvailabilityRequest, ApiError> {
        let time = parse_time(&self.time)?;
        let mut request =
            AvailabilityRequest::new(self.date_from, self.date_to, time, self.duration_hours);
        request.location = self.location;
        request.technician_id = self.technician_id.map(TechnicianId);
        Ok(request)
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| {
            ApiError::bad_request("Invalid time").with_details(format!("'{}': {}", value, e))
        })
}

/// Analysis request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub technician_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn into_request(self) -> AnalysisRequest {
        let request = AnalysisRequest::new(self.date_from, self.date_to).with_trigger(RunTrigger::Api);
        match self.technician_id {
            Some(technician) => request.with_technician(TechnicianId(technician)),
            None => request,
        }
    }
}

/// Query string for listing insights
#[derive(Debug, Default, Deserialize)]
pub struct InsightQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub technician: Option<String>,
    pub kind: Option<String>,
}

impl InsightQuery {
    pub fn into_filter(self) -> Result<InsightFilter, ApiError> {
        let mut filter = InsightFilter::new();
        if let Some(status) = self.status {
            let status: InsightStatus = status.parse().map_err(|e: FieldopsError| {
                ApiError::bad_request("Invalid status").with_details(e.to_string())
            })?;
            filter = filter.with_status(status);
        }
        if let Some(kind) = self.kind {
            let kind: InsightKind = kind.parse().map_err(|e: FieldopsError| {
                ApiError::bad_request("Invalid kind").with_details(e.to_string())
            })?;
            filter = filter.with_kind(kind);
        }
        if let Some(technician) = self.technician {
            filter = filter.with_technician(TechnicianId(technician));
        }
        filter.date_from = self.from;
        filter.date_to = self.to;
        Ok(filter)
    }
}

/// Optional note attached to a resolve or dismiss
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Query string for the run log listing
#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    #[serde(default = "default_run_limit")]
    pub limit: usize,
}

fn default_run_limit() -> usize {
    20
}
