use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::{require_admin, require_admin_layer},
    session::AppState,
};
use crate::api::{parse_date, parse_shift_id, parse_time};
use crate::domain::{
    availability,
    grouping::group_by_date,
    pagination::{PageParams, Pagination},
};
use crate::error::{AppError, Result};
use crate::models::{
    shift::{Shift, ShiftFields},
    signup::Signup,
};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Create or update payload. Every field is optional here so that create
/// can report missing fields uniformly and update can patch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// A number or a numeric string
    pub max_volunteers: Option<Value>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_max_volunteers(value: &Value) -> Result<i32> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .filter(|n| *n > 0)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            AppError::Validation("Max volunteers must be a positive number".to_string())
        })
}

impl ShiftRequest {
    /// Validates a complete shift for creation
    fn into_new_fields(self) -> Result<ShiftFields> {
        let (
            Some(title),
            Some(date),
            Some(start_time),
            Some(end_time),
            Some(location),
            Some(description),
            Some(max_volunteers),
        ) = (
            non_blank(&self.title),
            non_blank(&self.date),
            non_blank(&self.start_time),
            non_blank(&self.end_time),
            non_blank(&self.location),
            non_blank(&self.description),
            self.max_volunteers.as_ref().filter(|v| !v.is_null()),
        )
        else {
            return Err(AppError::Validation(ALL_FIELDS_REQUIRED.to_string()));
        };

        let fields = ShiftFields {
            title: title.to_string(),
            date: parse_date(date)?,
            start_time: parse_time(start_time)?,
            end_time: parse_time(end_time)?,
            location: location.to_string(),
            description: description.to_string(),
            max_volunteers: parse_max_volunteers(max_volunteers)?,
        };
        validate_fields(&fields)?;

        Ok(fields)
    }

    /// Applies the supplied fields on top of `current`
    fn apply_to(self, current: &Shift) -> Result<ShiftFields> {
        let mut fields = ShiftFields::from(current);

        if let Some(title) = non_blank(&self.title) {
            fields.title = title.to_string();
        }
        if let Some(date) = non_blank(&self.date) {
            fields.date = parse_date(date)?;
        }
        if let Some(start_time) = non_blank(&self.start_time) {
            fields.start_time = parse_time(start_time)?;
        }
        if let Some(end_time) = non_blank(&self.end_time) {
            fields.end_time = parse_time(end_time)?;
        }
        if let Some(location) = non_blank(&self.location) {
            fields.location = location.to_string();
        }
        if let Some(description) = non_blank(&self.description) {
            fields.description = description.to_string();
        }
        if let Some(max) = self.max_volunteers.as_ref().filter(|v| !v.is_null()) {
            fields.max_volunteers = parse_max_volunteers(max)?;
        }

        if fields.start_time >= fields.end_time {
            return Err(AppError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        if fields.date != current.date && fields.date < availability::today() {
            return Err(AppError::Validation(
                "Shifts cannot be scheduled in the past".to_string(),
            ));
        }

        Ok(fields)
    }
}

fn validate_fields(fields: &ShiftFields) -> Result<()> {
    if fields.start_time >= fields.end_time {
        return Err(AppError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }
    if fields.date < availability::today() {
        return Err(AppError::Validation(
            "Shifts cannot be scheduled in the past".to_string(),
        ));
    }
    Ok(())
}

/// Upcoming shifts grouped by date
async fn list_shifts(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>> {
    let today = availability::today();

    let shifts = Shift::list_upcoming(&state.pool, today, &page).await?;
    let total_count = Shift::count_upcoming(&state.pool, today).await?;

    let grouped = group_by_date(shifts, |s| s.shift.date);

    Ok(Json(json!({
        "shifts": grouped,
        "pagination": Pagination::new(&page, total_count),
    })))
}

async fn get_shift(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = parse_shift_id(&id)?;
    let shift = Shift::find_with_count(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    Ok(Json(json!({ "shift": shift })))
}

async fn create_shift(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<ShiftRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let admin = require_admin(&session).await?;
    let fields = req.into_new_fields()?;

    let shift = Shift::create(&state.pool, &fields, &admin.email).await?;

    tracing::info!(
        shift_id = %shift.id,
        date = %shift.date,
        created_by = %admin.email,
        "Shift created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Shift created successfully",
            "shift": shift,
        })),
    ))
}

async fn update_shift(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(req): Json<ShiftRequest>,
) -> Result<Json<Value>> {
    let admin = require_admin(&session).await?;
    let id = parse_shift_id(&id)?;

    let current = Shift::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    let fields = req.apply_to(&current)?;

    let shift = Shift::update(&state.pool, id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    tracing::info!(shift_id = %shift.id, updated_by = %admin.email, "Shift updated");

    Ok(Json(json!({
        "message": "Shift updated successfully",
        "shift": shift,
    })))
}

async fn delete_shift(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let admin = require_admin(&session).await?;
    let id = parse_shift_id(&id)?;

    if !Shift::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Shift not found".to_string()));
    }

    tracing::info!(shift_id = %id, deleted_by = %admin.email, "Shift deleted");

    Ok(Json(json!({ "message": "Shift deleted successfully" })))
}

/// Roster for one shift
async fn list_shift_signups(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_shift_id(&id)?;
    let shift = Shift::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    let signups = Signup::list_for_shift(&state.pool, shift.id).await?;

    Ok(Json(json!({
        "shift": shift,
        "signups": signups,
    })))
}

pub fn router() -> Router<AppState> {
    let admin_only = Router::new()
        .route("/api/shifts/:id/signups", get(list_shift_signups))
        .route_layer(from_fn(require_admin_layer));

    Router::new()
        .route("/api/shifts", get(list_shifts).post(create_shift))
        .route("/api/shift/create", post(create_shift))
        .route(
            "/api/shifts/:id",
            get(get_shift).put(update_shift).delete(delete_shift),
        )
        .merge(admin_only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use uuid::Uuid;

    fn full_request() -> ShiftRequest {
        let tomorrow = availability::today() + Duration::days(1);
        ShiftRequest {
            title: Some("Book sorting".to_string()),
            date: Some(tomorrow.format("%Y-%m-%d").to_string()),
            start_time: Some("09:00".to_string()),
            end_time: Some("12:00".to_string()),
            location: Some("Warehouse".to_string()),
            description: Some("Sort donated books".to_string()),
            max_volunteers: Some(json!("5")),
        }
    }

    #[test]
    fn test_create_accepts_numeric_string_capacity() {
        let fields = full_request().into_new_fields().unwrap();
        assert_eq!(fields.max_volunteers, 5);
        assert_eq!(fields.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_create_requires_every_field() {
        let req = ShiftRequest {
            description: Some("   ".to_string()),
            ..full_request()
        };
        let err = req.into_new_fields().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == ALL_FIELDS_REQUIRED));
    }

    #[test]
    fn test_create_rejects_bad_capacity() {
        for bad in [json!(0), json!(-3), json!("many"), json!(2.5), json!(true)] {
            let req = ShiftRequest {
                max_volunteers: Some(bad.clone()),
                ..full_request()
            };
            assert!(req.into_new_fields().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_create_rejects_inverted_times() {
        let req = ShiftRequest {
            start_time: Some("13:00".to_string()),
            end_time: Some("12:00".to_string()),
            ..full_request()
        };
        assert!(req.into_new_fields().is_err());
    }

    #[test]
    fn test_create_rejects_past_date() {
        let yesterday = availability::today() - Duration::days(1);
        let req = ShiftRequest {
            date: Some(yesterday.format("%Y-%m-%d").to_string()),
            ..full_request()
        };
        assert!(req.into_new_fields().is_err());
    }

    #[test]
    fn test_update_patches_only_supplied_fields() {
        let fields = full_request().into_new_fields().unwrap();
        let current = Shift {
            id: Uuid::new_v4(),
            title: fields.title.clone(),
            date: fields.date,
            start_time: fields.start_time,
            end_time: fields.end_time,
            location: fields.location.clone(),
            description: fields.description.clone(),
            max_volunteers: fields.max_volunteers,
            created_by: "principal@froebel.org".to_string(),
            created_at: chrono::Utc::now(),
        };

        let patch = ShiftRequest {
            title: Some("Book fair setup".to_string()),
            max_volunteers: Some(json!(8)),
            ..ShiftRequest::default()
        };
        let updated = patch.apply_to(&current).unwrap();

        assert_eq!(updated.title, "Book fair setup");
        assert_eq!(updated.max_volunteers, 8);
        assert_eq!(updated.location, current.location);
        assert_eq!(updated.date, current.date);
    }
}
