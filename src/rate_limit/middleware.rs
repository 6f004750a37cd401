use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::metrics::REQUEST_TOTAL;
use crate::models::RateLimitErrorBody;

use super::admission::{Admission, AdmissionResult, Rejection, to_rfc3339};
use super::identifier::RequestMeta;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_RATELIMIT_WINDOW: HeaderName = HeaderName::from_static("x-ratelimit-window");

/// Route-group state: which policy the wrapped handlers are charged against.
#[derive(Clone)]
pub struct EndpointGuard {
    pub admission: Arc<Admission>,
    pub endpoint: &'static str,
}

impl EndpointGuard {
    pub fn new(admission: Arc<Admission>, endpoint: &'static str) -> Self {
        Self { admission, endpoint }
    }
}

// DDoS guard first, then the endpoint policy. A 2xx answer hands the slot
// back when the policy skips successful requests.
pub async fn enforce(State(guard): State<EndpointGuard>, req: Request, next: Next) -> Response {
    REQUEST_TOTAL.with_label_values(&[guard.endpoint]).inc();
    let meta = RequestMeta::from_request(&req);

    if let AdmissionResult::Rejected(rejection) = guard.admission.ddos_check(&meta) {
        return rejection_response(&rejection);
    }

    let allowance = match guard.admission.admit(guard.endpoint, &meta) {
        AdmissionResult::Rejected(rejection) => return rejection_response(&rejection),
        AdmissionResult::Allowed(allowance) => allowance,
    };

    let mut response = next.run(req).await;

    let mut remaining = allowance.remaining;
    if response.status().is_success() {
        if let Some(token) = &allowance.release_token {
            if guard.admission.release(token) {
                remaining = (remaining + 1).min(allowance.limit);
            }
        }
    }

    write_headers(
        response.headers_mut(),
        allowance.limit,
        remaining,
        allowance.reset_at,
        allowance.window_ms,
    );
    response
}

fn write_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: u64, window_ms: u64) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    if let Ok(reset) = HeaderValue::from_str(&to_rfc3339(reset_at)) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
    // seconds
    headers.insert(X_RATELIMIT_WINDOW, HeaderValue::from(window_ms / 1000));
}

/// 429 with the JSON body and headers callers use to back off.
pub fn rejection_response(rejection: &Rejection) -> Response {
    let body = RateLimitErrorBody {
        error: rejection.message.clone(),
        retry_after: rejection.retry_after_secs,
        remaining: 0,
        reset_time: to_rfc3339(rejection.reset_at),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    write_headers(
        headers,
        rejection.limit,
        0,
        rejection.reset_at,
        rejection.window_ms,
    );
    headers.insert(RETRY_AFTER, HeaderValue::from(rejection.retry_after_secs));
    response
}
