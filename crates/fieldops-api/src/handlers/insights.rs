use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use fieldops_core::models::{InsightId, InsightRunLog, ScheduleInsight};
use fieldops_scheduling::AnalysisReport;

use crate::dto::{AnalyzeRequest, InsightListResponse, InsightQuery, RunsQuery, TransitionRequest};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let request = body.into_request();
    tracing::info!(from = %request.date_from, to = %request.date_to, "Running schedule analysis");

    let report = state.services.analyzer.analyze(&request).await?;
    Ok(Json(report))
}

pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InsightQuery>,
) -> Result<Json<InsightListResponse>, ApiError> {
    let filter = query.into_filter()?;
    let insights = state.services.analyzer.list(&filter).await?;
    Ok(Json(InsightListResponse::new(insights)))
}

pub async fn resolve_insight(
    State(state): State<Arc<AppState>>,
    Path(insight_id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<ScheduleInsight>, ApiError> {
    let id = parse_id(&insight_id)?;
    tracing::info!(insight_id = %id, "Resolving insight");

    let insight = state.services.analyzer.resolve(id, body.note).await?;
    Ok(Json(insight))
}

pub async fn dismiss_insight(
    State(state): State<Arc<AppState>>,
    Path(insight_id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<ScheduleInsight>, ApiError> {
    let id = parse_id(&insight_id)?;
    tracing::info!(insight_id = %id, "Dismissing insight");

    let insight = state.services.analyzer.dismiss(id, body.note).await?;
    Ok(Json(insight))
}

pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<InsightRunLog>>, ApiError> {
    let runs = state.services.analyzer.recent_runs(query.limit).await?;
    Ok(Json(runs))
}

fn parse_id(raw: &str) -> Result<InsightId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid insight ID format").with_details(raw.to_string()))
}
