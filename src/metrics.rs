use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder, register_histogram,
    register_int_counter, register_int_counter_vec, register_int_gauge,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "restaurant_requests_total",
        "Requests reaching a rate limited endpoint",
        &["endpoint"]
    )
    .unwrap();
    pub static ref ADMISSIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "restaurant_admissions_rejected_total",
        "Requests rejected by the rate limiter",
        &["policy"]
    )
    .unwrap();
    pub static ref SLOTS_RELEASED: IntCounter = register_int_counter!(
        "restaurant_rate_limit_released_total",
        "Slots given back after successful requests"
    )
    .unwrap();
    pub static ref STORE_ERRORS: IntCounter = register_int_counter!(
        "restaurant_rate_limit_store_errors_total",
        "Store faults answered by failing open"
    )
    .unwrap();
    pub static ref SWEPT_KEYS: IntCounter = register_int_counter!(
        "restaurant_rate_limit_swept_keys_total",
        "Keys removed by the expiry sweep"
    )
    .unwrap();
    pub static ref TRACKED_KEYS: IntGauge = register_int_gauge!(
        "restaurant_rate_limit_tracked_keys",
        "Keys currently held by the rate limit store"
    )
    .unwrap();
    pub static ref NOTIFICATION_FAILURES: IntCounter = register_int_counter!(
        "restaurant_notification_failures_total",
        "Outbound notifications that failed"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "restaurant_request_latency_seconds",
        "Handler latency in seconds"
    )
    .unwrap();
}

// Text exposition of the default registry
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Encode error: {}", e))?;
    String::from_utf8(buffer).map_err(|e| format!("Encode error: {}", e))
}
