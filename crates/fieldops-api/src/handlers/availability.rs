use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::{AvailabilityBody, AvailabilityResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AvailabilityBody>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let request = body.into_request()?;
    tracing::info!(
        from = %request.date_from,
        to = %request.date_to,
        time = %request.time,
        has_location = request.location.is_some(),
        "Checking availability"
    );

    let days = state.services.availability.get_available_days(&request).await?;
    Ok(Json(AvailabilityResponse::new(days)))
}
