// API module - HTTP endpoints

pub mod auth;
pub mod blackout;
pub mod health;
pub mod middleware;
pub mod shifts;
pub mod signups;
pub mod users;


use axum::{routing::get, Router};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::time_format;
use crate::error::{AppError, Result};
use middleware::session::AppState;

/// Every JSON route, without the session layer
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(users::router())
        .merge(shifts::router())
        .merge(signups::router())
        .merge(blackout::router())
}

/// Parses a `YYYY-MM-DD` calendar date from a request
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation("Invalid date format, expected YYYY-MM-DD".to_string())
    })
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime> {
    time_format::parse(raw)
        .ok_or_else(|| AppError::Validation("Invalid time format, expected HH:MM".to_string()))
}

/// Parses a shift id from a path segment or query value
pub(crate) fn parse_shift_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation("Invalid shift ID".to_string()))
}
