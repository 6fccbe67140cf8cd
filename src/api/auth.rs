use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::current_user,
    session::{AppState, SessionUser, SESSION_KEY_PENDING_EMAIL, SESSION_KEY_USER},
};
use crate::domain::email_address;
use crate::error::{AppError, Result};
use crate::models::{magic_link::MagicLink, user::User};
use crate::services::token;

const VERIFY_PATH: &str = "/api/auth/verify-magic-link";

#[derive(Debug, Deserialize)]
pub struct SendMagicLinkRequest {
    #[serde(default)]
    pub email: String,
}

/// Emails a single-use sign-in link
async fn send_magic_link(
    State(state): State<AppState>,
    Json(req): Json<SendMagicLinkRequest>,
) -> Result<Json<Value>> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let email = email_address::normalize(&req.email)
        .ok_or_else(|| AppError::Validation("Invalid email address".to_string()))?;

    let token = token::generate_token()?;
    let ttl_minutes = state.config.magic_link_ttl_minutes;
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    MagicLink::create(&state.pool, &token, &email, expires_at).await?;

    let link_url = magic_link_url(&state.config.base_url, &token)?;
    state
        .email
        .send_magic_link(&email, &link_url, ttl_minutes)
        .await?;

    tracing::info!(email = %email, "Magic link sent");

    Ok(Json(json!({ "message": "Magic link sent successfully" })))
}

/// `{BASE_URL}/api/auth/verify-magic-link?token=...`
fn magic_link_url(base_url: &str, token: &str) -> Result<String> {
    let mut url = url::Url::parse(base_url)
        .and_then(|base| base.join(VERIFY_PATH))
        .map_err(|e| AppError::Internal(e.into()))?;
    url.query_pairs_mut().append_pair("token", token);

    Ok(url.into())
}

#[derive(Debug, Deserialize)]
struct VerifyQuery {
    token: Option<String>,
}

/// What following a magic link led to
#[derive(Debug, PartialEq, Eq)]
enum SignInOutcome {
    InvalidToken,
    ExpiredToken,
    /// Verified address with no account yet; the volunteer finishes
    /// registration on the sign-in success page
    NeedsAccount(String),
    SignedIn,
}

impl SignInOutcome {
    fn redirect_target(&self) -> String {
        match self {
            SignInOutcome::InvalidToken => "/signin?error=invalid-token".to_string(),
            SignInOutcome::ExpiredToken => "/signin?error=expired-token".to_string(),
            SignInOutcome::NeedsAccount(email) => {
                let email: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
                format!("/signin/success?email={email}")
            }
            SignInOutcome::SignedIn => "/home?login=success".to_string(),
        }
    }
}

/// Redeems a magic link and redirects to the matching page
async fn verify_magic_link(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
    session: Session,
) -> Redirect {
    match redeem_magic_link(&state, params.token.as_deref(), &session).await {
        Ok(outcome) => Redirect::to(&outcome.redirect_target()),
        Err(e) => {
            tracing::error!(error = %e, "Magic link verification failed");
            Redirect::to("/signin?error=verification-failed")
        }
    }
}

async fn redeem_magic_link(
    state: &AppState,
    token: Option<&str>,
    session: &Session,
) -> Result<SignInOutcome> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(SignInOutcome::InvalidToken);
    };

    let Some(link) = MagicLink::consume(&state.pool, token).await? else {
        tracing::warn!("Unknown or already used magic link");
        return Ok(SignInOutcome::InvalidToken);
    };

    if link.is_expired_at(Utc::now()) {
        tracing::warn!(email = %link.email, "Expired magic link");
        return Ok(SignInOutcome::ExpiredToken);
    }

    match User::find_by_email(&state.pool, &link.email).await? {
        None => {
            session
                .insert(SESSION_KEY_PENDING_EMAIL, &link.email)
                .await?;
            tracing::info!(email = %link.email, "Verified email has no account yet");
            Ok(SignInOutcome::NeedsAccount(link.email))
        }
        Some(user) => {
            let user = User::touch_last_login(&state.pool, user.id).await?;
            start_session(session, &user).await?;
            tracing::info!(user_id = %user.id, "User signed in via magic link");
            Ok(SignInOutcome::SignedIn)
        }
    }
}

/// Binds `user` to the session under a fresh session id
pub(crate) async fn start_session(session: &Session, user: &User) -> Result<SessionUser> {
    session.cycle_id().await?;
    session.remove::<String>(SESSION_KEY_PENDING_EMAIL).await?;

    let session_user = SessionUser::from(user);
    session.insert(SESSION_KEY_USER, &session_user).await?;

    Ok(session_user)
}

/// Returns the signed-in user, or `null`
async fn get_session(session: Session) -> Result<Json<Value>> {
    let user = current_user(&session).await?;
    Ok(Json(json!({ "user": user })))
}

/// Signs out by destroying the server-side session
async fn delete_session(session: Session) -> Result<Json<Value>> {
    session.flush().await?;
    Ok(Json(json!({ "success": true })))
}

/// Creates the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/send-magic-link", post(send_magic_link))
        .route(VERIFY_PATH, get(verify_magic_link))
        .route("/api/auth/session", get(get_session).delete(delete_session))
}
