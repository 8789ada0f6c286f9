mod request;
mod response;

pub use request::{AnalyzeRequest, AvailabilityBody, InsightQuery, RunsQuery, TransitionRequest};
pub use response::{AvailabilityResponse, HealthResponse, InsightListResponse};
