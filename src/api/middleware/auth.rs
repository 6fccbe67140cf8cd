use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use super::session::{SessionUser, SESSION_KEY_USER};
use crate::error::{AppError, Result};

/// The signed-in user, if any
pub async fn current_user(session: &Session) -> Result<Option<SessionUser>> {
    Ok(session.get::<SessionUser>(SESSION_KEY_USER).await?)
}

/// Extracts the signed-in user or fails with 401
pub async fn require_user(session: &Session) -> Result<SessionUser> {
    current_user(session).await?.ok_or(AppError::Unauthorized)
}

/// Extracts the signed-in user and insists on the admin role
pub async fn require_admin(session: &Session) -> Result<SessionUser> {
    let user = require_user(session).await?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.user_id, "Non-admin attempted an admin action");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(user)
}

/// Middleware guarding admin-only routes
pub async fn require_admin_layer(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response> {
    require_admin(&session).await?;
    Ok(next.run(request).await)
}
