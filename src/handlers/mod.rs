mod admin;
mod bookings;
mod health;
mod metrics;
mod status;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::rate_limit::policy::GENERAL;
use crate::rate_limit::{EndpointGuard, enforce};
use crate::state::AppState;

pub use admin::{list_reservations, rate_limit_overview, reset_rate_limit};
pub use bookings::{availability, create_catering, create_feedback, create_reservation};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use status::rate_limit_status;

// Every public write endpoint and the admin API is charged against its own
// policy. Only matched methods are charged; a 405 costs nothing.
pub fn router(state: Arc<AppState>) -> Router {
    let admission = Arc::clone(&state.admission);
    let guarded = |endpoint: &'static str| {
        middleware::from_fn_with_state(EndpointGuard::new(Arc::clone(&admission), endpoint), enforce)
    };

    let admin = Router::new()
        .route("/reservations", get(list_reservations))
        .route("/rate-limits", get(rate_limit_overview))
        .route("/rate-limits/{endpoint}/{identifier}", delete(reset_rate_limit))
        .route_layer(guarded("admin"));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/reservations", post(create_reservation).route_layer(guarded("reservations")))
        .route("/api/catering", post(create_catering).route_layer(guarded("catering")))
        .route("/api/feedback", post(create_feedback).route_layer(guarded("feedback")))
        .route("/api/availability", get(availability).route_layer(guarded("availability")))
        .route("/api/rate-limit/status", get(rate_limit_status).route_layer(guarded(GENERAL)))
        .nest("/api/admin", admin)
        .with_state(state)
}
