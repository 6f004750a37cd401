//! Restaurant website API: reservations, catering inquiries, guest feedback
//! and availability lookups, each behind per-endpoint admission control.

pub mod bookings;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod rate_limit;
pub mod state;
pub mod validation;
