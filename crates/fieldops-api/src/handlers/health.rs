use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use fieldops_llm::HealthState;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let enhancer = match &state.enhancer_health {
        None => "not configured".to_string(),
        Some(health) => match health.state(Utc::now()) {
            HealthState::Healthy => "healthy".to_string(),
            HealthState::CoolingDown { until } => format!("cooling down until {}", until.to_rfc3339()),
            HealthState::Disabled { reason } => format!("disabled: {}", reason),
        },
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.to_string(),
        enhancer,
    })
}
