use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use log::info;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{NewReservation, PolicySummary, RateLimitOverview, Stored};
use crate::state::AppState;

pub async fn list_reservations(State(state): State<Arc<AppState>>) -> Json<Vec<Stored<NewReservation>>> {
    Json(state.repository.reservations())
}

pub async fn rate_limit_overview(State(state): State<Arc<AppState>>) -> Json<RateLimitOverview> {
    let mut policies: Vec<PolicySummary> = state
        .admission
        .policies()
        .iter()
        .map(|p| PolicySummary {
            endpoint: p.endpoint.clone(),
            window_ms: p.window_ms,
            max_requests: p.max_requests,
            skip_successful_requests: p.skip_successful_requests,
        })
        .collect();
    policies.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

    Json(RateLimitOverview {
        tracked_keys: state.admission.tracked_keys(),
        policies,
    })
}

// Lift the limit for one caller, e.g. a guest who got locked out by a shared office IP
pub async fn reset_rate_limit(
    State(state): State<Arc<AppState>>,
    Path((endpoint, identifier)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    if state.admission.reset(&endpoint, &identifier) {
        info!("Rate limit reset for {}:{}", endpoint, identifier);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("rate limit entry {}:{}", endpoint, identifier)))
    }
}
