//! Routing provider port and the distance-matrix HTTP adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to an external provider
///
/// These never reach top-level callers; the estimator treats any of them as
/// an unknown estimate.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("No route between the requested points: {0}")]
    NoRoute(String),

    #[error("No routing provider configured")]
    NotConfigured,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Raw provider answer for one origin/destination pair
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub polyline: Option<String>,
}

/// Port for point-to-point driving estimates
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Estimate a drive from `origin` to `destination`
    ///
    /// `departure` is only passed for future instants; traffic-aware
    /// providers reject past timestamps.
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        departure: Option<DateTime<Utc>>,
    ) -> Result<RouteEstimate, ProviderError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Google Distance Matrix adapter
pub struct DistanceMatrixProvider {
    /// Base URL for the API (e.g., "https://maps.googleapis.com")
    base_url: String,

    api_key: String,

    /// HTTP client with the per-request timeout applied
    client: reqwest::Client,
}

impl DistanceMatrixProvider {
    /// Create a new provider with a per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url: base_url.into(), api_key: api_key.into(), client })
    }

    /// Create against the public Google endpoint
    pub fn google(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("https://maps.googleapis.com", api_key, timeout)
    }
}

#[async_trait]
impl RoutingProvider for DistanceMatrixProvider {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        departure: Option<DateTime<Utc>>,
    ) -> Result<RouteEstimate, ProviderError> {
        let mut query = vec![
            ("origins", origin.to_string()),
            ("destinations", destination.to_string()),
            ("mode", "driving".to_string()),
            ("units", "metric".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(departure) = departure {
            query.push(("departure_time", departure.timestamp().to_string()));
        }

        let response = self
            .client
            .get(format!("{}/maps/api/distancematrix/json", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let matrix: DistanceMatrixResponse = response.json().await?;
        parse_distance_matrix(matrix)
    }

    fn name(&self) -> &str {
        "google-distance-matrix"
    }
}

/// Stand-in used when no routing credentials are configured
///
/// Every leg is unknown, so travel-dependent days fall back to unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl RoutingProvider for UnconfiguredProvider {
    async fn route(
        &self,
        _origin: &str,
        _destination: &str,
        _departure: Option<DateTime<Utc>>,
    ) -> Result<RouteEstimate, ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

/// Extract the single element of a one-by-one distance matrix
pub fn parse_distance_matrix(matrix: DistanceMatrixResponse) -> Result<RouteEstimate, ProviderError> {
    if matrix.status != "OK" {
        return Err(ProviderError::Malformed(format!(
            "top-level status {}{}",
            matrix.status,
            matrix.error_message.map(|m| format!(": {}", m)).unwrap_or_default()
        )));
    }

    let element = matrix
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| ProviderError::Malformed("empty matrix".to_string()))?;

    if element.status != "OK" {
        return Err(ProviderError::NoRoute(element.status));
    }

    let duration = element
        .duration_in_traffic
        .or(element.duration)
        .ok_or_else(|| ProviderError::Malformed("element has no duration".to_string()))?;
    let distance = element
        .distance
        .ok_or_else(|| ProviderError::Malformed("element has no distance".to_string()))?;

    Ok(RouteEstimate {
        duration_seconds: duration.value,
        distance_meters: distance.value,
        polyline: None,
    })
}

/// Response from the distance-matrix API
#[derive(Debug, Deserialize)]
pub struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    duration: Option<MatrixValue>,
    duration_in_traffic: Option<MatrixValue>,
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<RouteEstimate, ProviderError> {
        parse_distance_matrix(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_prefers_traffic_duration() {
        let estimate = parse(
            r#"{"status":"OK","rows":[{"elements":[{"status":"OK",
                "duration":{"value":1200,"text":"20 mins"},
                "duration_in_traffic":{"value":1500,"text":"25 mins"},
                "distance":{"value":18000,"text":"18 km"}}]}]}"#,
        )
        .unwrap();
        assert_eq!(estimate.duration_seconds, 1500.0);
        assert_eq!(estimate.distance_meters, 18000.0);
    }

    #[test]
    fn test_parse_without_traffic() {
        let estimate = parse(
            r#"{"status":"OK","rows":[{"elements":[{"status":"OK",
                "duration":{"value":600},"distance":{"value":5000}}]}]}"#,
        )
        .unwrap();
        assert_eq!(estimate.duration_seconds, 600.0);
    }

    #[test]
    fn test_parse_element_not_found() {
        let result = parse(r#"{"status":"OK","rows":[{"elements":[{"status":"NOT_FOUND"}]}]}"#);
        assert!(matches!(result, Err(ProviderError::NoRoute(s)) if s == "NOT_FOUND"));
    }

    #[test]
    fn test_parse_request_denied() {
        let result = parse(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#);
        assert!(matches!(result, Err(ProviderError::Malformed(m)) if m.contains("bad key")));
    }

    #[test]
    fn test_parse_empty_rows() {
        assert!(matches!(parse(r#"{"status":"OK","rows":[]}"#), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn test_provider_creation() {
        let provider =
            DistanceMatrixProvider::new("http://localhost:9999", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999");
        assert_eq!(provider.name(), "google-distance-matrix");
    }
}
