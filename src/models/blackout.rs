use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

/// Admin-defined days on which no new signups are accepted
pub struct BlackoutDate;

impl BlackoutDate {
    /// All blackout dates, ascending
    pub async fn list(pool: &PgPool) -> Result<Vec<NaiveDate>, sqlx::Error> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT date FROM blackout_dates ORDER BY date ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(date,)| date).collect())
    }

    pub async fn is_blacked_out<'e>(
        executor: impl PgExecutor<'e>,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM blackout_dates WHERE date = $1)
            "#,
        )
        .bind(date)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Returns `false` when the date was already blacked out
    pub async fn add(pool: &PgPool, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO blackout_dates (date)
            VALUES ($1)
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(date)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns `false` when the date was not blacked out
    pub async fn remove(pool: &PgPool, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM blackout_dates WHERE date = $1
            "#,
        )
        .bind(date)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
