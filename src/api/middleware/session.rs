use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};
use uuid::Uuid;

use crate::config::Config;
use crate::models::user::{User, ROLE_ADMIN};
use crate::services::email::EmailClient;

/// Session keys used in the application
pub const SESSION_KEY_USER: &str = "user";
pub const SESSION_KEY_PENDING_EMAIL: &str = "pending_email";

/// Cookie carrying the opaque session id
pub const SESSION_COOKIE_NAME: &str = "sessionId";

/// The signed-in user, as cached in the server-side session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.clone(),
        }
    }
}

/// Creates a session layer for Axum.
///
/// Sessions expire after `SESSION_TTL_DAYS` of inactivity; every request
/// re-saves the session, which pushes the expiry forward.
pub fn create_session_layer<S>(store: S, config: &Config) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_http_only(true)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_always_save(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            config.session_ttl_days,
        )))
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub email: EmailClient,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_session_user_json_shape() {
        let user = User {
            id: Uuid::new_v4(),
            email: "parent@example.com".to_string(),
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
            role: "volunteer".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        };

        let session_user = SessionUser::from(&user);
        assert!(!session_user.is_admin());

        let json = serde_json::to_value(&session_user).unwrap();
        assert_eq!(json["userId"], user.id.to_string());
        assert_eq!(json["firstName"], "Grace");
        assert_eq!(json["role"], "volunteer");
    }
}
