use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Availability
        .route("/api/v1/availability", post(handlers::check_availability))

        // Insights
        .route("/api/v1/insights/analyze", post(handlers::analyze))
        .route("/api/v1/insights", get(handlers::list_insights))
        .route("/api/v1/insights/runs", get(handlers::list_runs))
        .route("/api/v1/insights/{insight_id}/resolve", post(handlers::resolve_insight))
        .route("/api/v1/insights/{insight_id}/dismiss", post(handlers::dismiss_insight))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
