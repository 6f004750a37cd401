use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// Reservation form as posted by the website
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM
    pub party_size: u32,
    #[serde(default)]
    pub special_requests: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CateringRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub event_date: String,
    pub guest_count: u32,
    pub event_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub rating: u8,
    pub message: String,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: String,
    #[serde(default)]
    pub party_size: Option<u32>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StatusQuery {
    #[serde(default)]
    pub endpoint: Option<String>,
}

// Validated, sanitized records handed to the repository

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub special_requests: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCateringInquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub event_type: String,
    pub message: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub name: Option<String>,
    pub email: Option<String>,
    pub rating: u8,
    pub message: String,
}

/// A stored row: repository id, creation time and the validated payload.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: T,
}

// Response bodies

#[derive(Serialize, Deserialize, Debug)]
pub struct Created {
    pub success: bool,
    pub id: u64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub party_size: u32,
    pub slots: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitErrorBody {
    pub error: String,
    pub retry_after: u64,
    pub remaining: u32,
    pub reset_time: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatusBody {
    pub endpoint: String,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: String,
    pub window_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitOverview {
    pub tracked_keys: usize,
    pub policies: Vec<PolicySummary>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PolicySummary {
    pub endpoint: String,
    pub window_ms: u64,
    pub max_requests: u32,
    pub skip_successful_requests: bool,
}
