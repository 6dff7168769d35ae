pub mod audit;
pub mod bookings;
pub mod customers;
pub mod health;
pub mod sales;
pub mod services;
pub mod staff;
pub mod stats;

use axum::http::HeaderMap;
use chrono::{NaiveDate, NaiveTime};

use crate::errors::AppError;

/// Identity recorded in the audit trail. Authentication lives outside this
/// service; the dashboard passes the signed-in user through a header.
pub fn actor_from(headers: &HeaderMap) -> String {
    headers
        .get("x-user")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("system")
        .to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::domain(format!("Invalid date '{s}', expected YYYY-MM-DD")))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| AppError::domain(format!("Invalid time '{s}', expected HH:MM")))
}
