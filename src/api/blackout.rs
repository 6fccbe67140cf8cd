use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::api::parse_date;
use crate::domain::availability::{self, check_blackout_date, check_school_date};
use crate::error::{AppError, Result};
use crate::models::blackout::BlackoutDate;

#[derive(Debug, Deserialize)]
struct DateParam {
    date: Option<String>,
}

impl DateParam {
    fn date(&self) -> Result<NaiveDate> {
        let raw = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::Validation("Date is required".to_string()))?;
        parse_date(raw)
    }
}

async fn list_blackout_dates(State(state): State<AppState>) -> Result<Json<Value>> {
    let dates = BlackoutDate::list(&state.pool).await?;
    Ok(Json(json!({ "dates": dates })))
}

async fn add_blackout_date(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<DateParam>,
) -> Result<(StatusCode, Json<Value>)> {
    let admin = require_admin(&session).await?;
    let date = body.date()?;

    check_blackout_date(date, availability::today()).map_err(|_| {
        AppError::Validation("Blackout dates must be weekdays from today onward".to_string())
    })?;

    if !BlackoutDate::add(&state.pool, date).await? {
        return Err(AppError::Conflict("Date already blacked out".to_string()));
    }

    tracing::info!(date = %date, added_by = %admin.email, "Blackout date added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Blackout date added successfully" })),
    ))
}

async fn remove_blackout_date(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DateParam>,
) -> Result<Json<Value>> {
    let admin = require_admin(&session).await?;
    let date = query.date()?;

    if !BlackoutDate::remove(&state.pool, date).await? {
        return Err(AppError::NotFound("Blackout date not found".to_string()));
    }

    tracing::info!(date = %date, removed_by = %admin.email, "Blackout date removed");

    Ok(Json(json!({ "message": "Blackout date removed successfully" })))
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub date: NaiveDate,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Availability {
    fn evaluate(date: NaiveDate, today: NaiveDate, blacked_out: bool) -> Self {
        match check_school_date(date, today, blacked_out) {
            Ok(()) => Self {
                date,
                available: true,
                reason: None,
                message: None,
            },
            Err(rejection) => Self {
                date,
                available: false,
                reason: Some(rejection.code()),
                message: Some(rejection.to_string()),
            },
        }
    }
}

/// Whether a school visit could be booked on `?date=`
async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<DateParam>,
) -> Result<Json<Availability>> {
    let date = query.date()?;
    let blacked_out = BlackoutDate::is_blacked_out(&state.pool, date).await?;

    Ok(Json(Availability::evaluate(
        date,
        availability::today(),
        blacked_out,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/blackout-dates",
            get(list_blackout_dates)
                .post(add_blackout_date)
                .delete(remove_blackout_date),
        )
        .route("/api/availability", get(check_availability))
}
