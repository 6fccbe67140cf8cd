use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::auth::start_session;
use crate::api::middleware::{
    auth::require_user,
    session::{AppState, SESSION_KEY_PENDING_EMAIL, SESSION_KEY_USER},
};
use crate::error::{AppError, Result};
use crate::models::user::{CreateUserData, User, ROLE_ADMIN, ROLE_VOLUNTEER};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Finishes registration for an address verified by a magic link
async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>> {
    let pending_email: String = session
        .get(SESSION_KEY_PENDING_EMAIL)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if let Some(claimed) = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !claimed.eq_ignore_ascii_case(&pending_email) {
            return Err(AppError::Forbidden(
                "Email does not match the verified address".to_string(),
            ));
        }
    }

    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation(
            "Email, first name, and last name are required".to_string(),
        ));
    }

    if User::find_by_email(&state.pool, &pending_email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account already exists for this email".to_string(),
        ));
    }

    let role = if state.config.is_admin_email(&pending_email) {
        ROLE_ADMIN
    } else {
        ROLE_VOLUNTEER
    };

    let user = User::create(
        &state.pool,
        CreateUserData {
            email: pending_email,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("An account already exists for this email".to_string())
        }
        other => AppError::Database(other),
    })?;

    let user = User::touch_last_login(&state.pool, user.id).await?;
    let session_user = start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User account created");

    Ok(Json(json!({
        "message": "User account created successfully",
        "user": session_user,
    })))
}

/// Renames the signed-in user and refreshes the session copy
async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>> {
    let current = require_user(&session).await?;

    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation(
            "First name and last name are required".to_string(),
        ));
    }

    let user = User::update_name(&state.pool, current.user_id, first_name, last_name)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut session_user = current;
    session_user.first_name = user.first_name.clone();
    session_user.last_name = user.last_name.clone();
    session.insert(SESSION_KEY_USER, &session_user).await?;

    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": {
            "firstName": user.first_name,
            "lastName": user.last_name,
        },
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/create", post(create_user))
        .route("/api/users/update", put(update_user))
}
