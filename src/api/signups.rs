use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::require_user, session::AppState};
use crate::api::{parse_date, parse_shift_id, parse_time};
use crate::domain::{
    availability,
    grouping::group_by_date,
    pagination::{PageParams, Pagination},
};
use crate::error::{AppError, Result};
use crate::models::signup::{Signup, SignupKind};
use crate::services::shift_signup::{self, SchoolVisit, SignupExtras, VolunteerContact};

const REQUIRED_FIELDS_MISSING: &str = "Required fields are missing";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignupRequest {
    #[serde(rename = "type", default)]
    pub kind: SignupKind,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    pub shift_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub grade_preference: Option<String>,
    pub organization: Option<String>,
    pub comments: Option<String>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(REQUIRED_FIELDS_MISSING.to_string()))
}

impl CreateSignupRequest {
    /// Contact fields, with the user id taken from the session
    fn contact(&self, user_id: Uuid) -> Result<VolunteerContact> {
        let fields = [
            self.first_name.trim(),
            self.last_name.trim(),
            self.email.trim(),
            self.phone_number.trim(),
        ];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(AppError::Validation(REQUIRED_FIELDS_MISSING.to_string()));
        }
        let [first_name, last_name, email, phone_number] = fields.map(str::to_string);

        Ok(VolunteerContact {
            user_id,
            first_name,
            last_name,
            email,
            phone_number,
        })
    }

    fn school_visit(&self) -> Result<SchoolVisit> {
        Ok(SchoolVisit {
            date: parse_date(required(&self.date)?)?,
            start_time: parse_time(required(&self.start_time)?)?,
            end_time: parse_time(required(&self.end_time)?)?,
        })
    }

    fn extras(self) -> SignupExtras {
        SignupExtras {
            grade_preference: optional_text(self.grade_preference),
            organization: optional_text(self.organization),
            comments: optional_text(self.comments),
        }
    }
}

/// Books a warehouse shift seat or registers a school visit
async fn create_signup(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateSignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = require_user(&session).await?;
    let contact = req.contact(user.user_id)?;
    let today = availability::today();
    let kind = req.kind;

    let signup = match kind {
        SignupKind::Warehouse => {
            let shift_id = parse_shift_id(required(&req.shift_id)?)?;
            shift_signup::sign_up_for_shift(&state.pool, shift_id, contact, req.extras(), today)
                .await?
        }
        SignupKind::School => {
            let visit = req.school_visit()?;
            shift_signup::register_school_visit(&state.pool, visit, contact, req.extras(), today)
                .await?
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Successfully signed up for shift",
            "signup": signup,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShiftIdQuery {
    shift_id: Option<String>,
}

impl ShiftIdQuery {
    fn shift_id(&self) -> Result<Uuid> {
        let raw = self
            .shift_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation("Shift ID is required".to_string()))?;
        parse_shift_id(raw)
    }
}

/// The caller's signup for a shift, if any
async fn check_signup(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ShiftIdQuery>,
) -> Result<Json<Value>> {
    let user = require_user(&session).await?;
    let shift_id = query.shift_id()?;

    let signup = Signup::find_for_shift_and_user(&state.pool, shift_id, user.user_id).await?;

    Ok(Json(json!({ "signup": signup })))
}

async fn count_signups(
    State(state): State<AppState>,
    Query(query): Query<ShiftIdQuery>,
) -> Result<Json<Value>> {
    let shift_id = query.shift_id()?;
    let count = Signup::count_for_shift(&state.pool, shift_id).await?;

    Ok(Json(json!({ "count": count })))
}

/// The caller's upcoming warehouse shifts and school visits, grouped by date
async fn my_shifts(
    State(state): State<AppState>,
    session: Session,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>> {
    let user = require_user(&session).await?;
    let today = availability::today();

    let shifts = Signup::list_upcoming_for_user(&state.pool, user.user_id, today, &page).await?;
    let total_count = Signup::count_upcoming_for_user(&state.pool, user.user_id, today).await?;

    Ok(Json(json!({
        "shifts": group_by_date(shifts, |s| s.date),
        "pagination": Pagination::new(&page, total_count),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/signups/create", post(create_signup))
        .route("/api/signups/check", get(check_signup))
        .route("/api/signups/count", get(count_signups))
        .route("/api/signups/my-shifts", get(my_shifts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> CreateSignupRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_type_defaults_to_warehouse() {
        let req = request(json!({ "firstName": "Ada" }));
        assert_eq!(req.kind, SignupKind::Warehouse);

        let req = request(json!({ "type": "school" }));
        assert_eq!(req.kind, SignupKind::School);
    }

    #[test]
    fn test_contact_requires_all_fields() {
        let req = request(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phoneNumber": "  ",
        }));
        let err = req.contact(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == REQUIRED_FIELDS_MISSING));
    }

    #[test]
    fn test_contact_ignores_client_user_id() {
        let session_user = Uuid::new_v4();
        let req = request(json!({
            "userId": Uuid::new_v4(),
            "firstName": " Ada ",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phoneNumber": "314-555-0100",
        }));

        let contact = req.contact(session_user).unwrap();
        assert_eq!(contact.user_id, session_user);
        assert_eq!(contact.first_name, "Ada");
    }

    #[test]
    fn test_school_visit_needs_date_and_times() {
        let req = request(json!({ "type": "school", "date": "2030-01-07", "startTime": "09:00" }));
        assert!(req.school_visit().is_err());

        let req = request(json!({
            "type": "school",
            "date": "2030-01-07",
            "startTime": "09:00",
            "endTime": "11:30",
        }));
        let visit = req.school_visit().unwrap();
        assert_eq!(visit.date, chrono::NaiveDate::from_ymd_opt(2030, 1, 7).unwrap());
    }

    #[test]
    fn test_blank_extras_are_dropped() {
        let req = request(json!({ "organization": "  ", "comments": "Bring gloves" }));
        let extras = req.extras();
        assert_eq!(extras.organization, None);
        assert_eq!(extras.comments.as_deref(), Some("Bring gloves"));
    }

    #[test]
    fn test_shift_id_query() {
        let missing = ShiftIdQuery { shift_id: Some(" ".to_string()) };
        assert!(matches!(missing.shift_id(), Err(AppError::Validation(msg)) if msg == "Shift ID is required"));

        let bad = ShiftIdQuery { shift_id: Some("abc".to_string()) };
        assert!(bad.shift_id().is_err());
    }
}
