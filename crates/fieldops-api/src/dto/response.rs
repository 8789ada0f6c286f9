use fieldops_core::models::{DayAvailability, ScheduleInsight};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub enhancer: String,
}

/// Availability response, one entry per requested day
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub days: Vec<DayAvailability>,
    pub available_count: usize,
}

impl AvailabilityResponse {
    pub fn new(days: Vec<DayAvailability>) -> Self {
        let available_count = days.iter().filter(|d| d.available).count();
        Self { days, available_count }
    }
}

/// Insight listing response
#[derive(Debug, Serialize)]
pub struct InsightListResponse {
    pub insights: Vec<ScheduleInsight>,
    pub count: usize,
}

impl InsightListResponse {
    pub fn new(insights: Vec<ScheduleInsight>) -> Self {
        let count = insights.len();
        Self { insights, count }
    }
}
