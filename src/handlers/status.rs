use axum::{
    Json,
    extract::{Query, Request, State},
};
use std::sync::Arc;

use crate::models::{RateLimitStatusBody, StatusQuery};
use crate::rate_limit::admission::to_rfc3339;
use crate::rate_limit::policy::GENERAL;
use crate::rate_limit::RequestMeta;
use crate::state::AppState;

// Lets the website show how many attempts a guest has left
pub async fn rate_limit_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
    req: Request,
) -> Json<RateLimitStatusBody> {
    let endpoint = query.endpoint.unwrap_or_else(|| GENERAL.to_string());
    let meta = RequestMeta::from_request(&req);
    let status = state.admission.status(&endpoint, &meta);

    Json(RateLimitStatusBody {
        endpoint,
        limit: status.limit,
        remaining: status.remaining,
        reset_time: to_rfc3339(status.reset_at),
        window_seconds: status.window_ms / 1000,
    })
}
