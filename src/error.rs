use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::availability::DateRejection;
use crate::services::{email::EmailError, shift_signup::SignupError, token::TokenError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Email delivery error: {0}")]
    Email(#[from] EmailError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<DateRejection> for AppError {
    fn from(rejection: DateRejection) -> Self {
        AppError::Validation(rejection.to_string())
    }
}

impl From<SignupError> for AppError {
    fn from(error: SignupError) -> Self {
        match error {
            SignupError::DatabaseError(e) => AppError::Database(e),
            SignupError::ShiftNotFound => AppError::NotFound(error.to_string()),
            SignupError::AlreadySignedUp
            | SignupError::AlreadySignedUpForDate
            | SignupError::ShiftFull => AppError::Conflict(error.to_string()),
            SignupError::DateUnavailable(_) | SignupError::InvalidTimeRange => {
                AppError::Validation(error.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Session(_) | AppError::Token(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::Email(_) => (StatusCode::BAD_GATEWAY, "Failed to send email".to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
