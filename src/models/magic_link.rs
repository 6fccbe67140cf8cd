use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::services::token::hash_token;

/// A pending sign-in link. The raw token only ever exists in the email;
/// rows are keyed by its SHA-256 digest.
#[derive(Debug, Clone, FromRow)]
pub struct MagicLink {
    pub token_hash: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MagicLink {
    pub async fn create(
        pool: &PgPool,
        token: &str,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO magic_links (token_hash, email, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(hash_token(token))
        .bind(email)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Removes the link and hands it back in one statement, so a token can
    /// only ever be redeemed once. Expired links are consumed too; the
    /// caller decides what expiry means.
    pub async fn consume(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            DELETE FROM magic_links
            WHERE token_hash = $1
            RETURNING *
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM magic_links WHERE expires_at <= NOW()
            "#,
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
