use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::REQUEST_LATENCY;
use crate::models::{
    AvailabilityQuery, AvailabilityResponse, CateringRequest, Created, FeedbackRequest,
    ReservationRequest,
};
use crate::notify::{NotificationKind, dispatch};
use crate::state::AppState;
use crate::validation::{validate_availability, validate_catering, validate_feedback, validate_reservation};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// Staff notification goes out in the background; the caller never waits on it
fn notify<T: Serialize>(state: &AppState, kind: NotificationKind, record: &T) {
    match serde_json::to_value(record) {
        Ok(payload) => dispatch(&state.notifier, kind, payload),
        Err(e) => warn!("Could not encode {:?} notification: {}", kind, e),
    }
}

pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let start_time = Instant::now();

    let reservation = validate_reservation(&payload, today())?;
    let stored = state.repository.insert_reservation(reservation)?;
    info!(
        "Reservation {} booked: {} guests on {} at {}",
        stored.id,
        stored.record.party_size,
        stored.record.date,
        stored.record.time.format("%H:%M")
    );
    notify(&state, NotificationKind::ReservationCreated, &stored);

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok((StatusCode::CREATED, Json(Created { success: true, id: stored.id })))
}

pub async fn create_catering(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CateringRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let start_time = Instant::now();

    let inquiry = validate_catering(&payload, today())?;
    let stored = state.repository.insert_catering(inquiry);
    info!(
        "Catering inquiry {} received for {} guests",
        stored.id, stored.record.guest_count
    );
    notify(&state, NotificationKind::CateringInquiry, &stored);

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok((StatusCode::CREATED, Json(Created { success: true, id: stored.id })))
}

pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let start_time = Instant::now();

    let feedback = validate_feedback(&payload)?;
    let stored = state.repository.insert_feedback(feedback);
    info!("Feedback {} received ({} stars)", stored.id, stored.record.rating);
    notify(&state, NotificationKind::FeedbackReceived, &stored);

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok((StatusCode::CREATED, Json(Created { success: true, id: stored.id })))
}

pub async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let (date, party_size) = validate_availability(&query, today())?;
    let slots = state
        .repository
        .available_slots(date, party_size)
        .into_iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();

    Ok(Json(AvailabilityResponse {
        date,
        party_size,
        slots,
    }))
}
