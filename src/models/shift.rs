use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{pagination::PageParams, time_format};

/// An admin-scheduled warehouse shift
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    pub location: String,
    pub description: String,
    pub max_volunteers: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A shift together with its live signup count
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShiftWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub shift: Shift,
    pub spots_filled: i64,
}

/// Editable shift fields, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftFields {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    pub description: String,
    pub max_volunteers: i32,
}

impl From<&Shift> for ShiftFields {
    fn from(shift: &Shift) -> Self {
        Self {
            title: shift.title.clone(),
            date: shift.date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            location: shift.location.clone(),
            description: shift.description.clone(),
            max_volunteers: shift.max_volunteers,
        }
    }
}

const SELECT_WITH_COUNT: &str = r#"
    SELECT s.*,
           (SELECT COUNT(*) FROM signups g WHERE g.shift_id = s.id) AS spots_filled
    FROM shifts s
"#;

impl Shift {
    pub async fn create(
        pool: &PgPool,
        fields: &ShiftFields,
        created_by: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO shifts
                (title, date, start_time, end_time, location, description, max_volunteers, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(fields.date)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.location)
        .bind(&fields.description)
        .bind(fields.max_volunteers)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM shifts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads the shift and holds a row lock on it until the surrounding
    /// transaction ends. Concurrent signups for the same shift serialise here.
    pub async fn lock_for_signup<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM shifts WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_with_count(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ShiftWithCount>, sqlx::Error> {
        let query = format!("{SELECT_WITH_COUNT} WHERE s.id = $1");

        sqlx::query_as::<_, ShiftWithCount>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Shifts on or after `today`, earliest first
    pub async fn list_upcoming(
        pool: &PgPool,
        today: NaiveDate,
        page: &PageParams,
    ) -> Result<Vec<ShiftWithCount>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_COUNT} WHERE s.date >= $1 ORDER BY s.date ASC, s.start_time ASC LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, ShiftWithCount>(&query)
            .bind(today)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count_upcoming(pool: &PgPool, today: NaiveDate) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM shifts WHERE date >= $1
            "#,
        )
        .bind(today)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Overwrites every editable field. Returns `None` if the shift is gone.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        fields: &ShiftFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE shifts
            SET title = $2,
                date = $3,
                start_time = $4,
                end_time = $5,
                location = $6,
                description = $7,
                max_volunteers = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(fields.date)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.location)
        .bind(&fields.description)
        .bind(fields.max_volunteers)
        .fetch_optional(pool)
        .await
    }

    /// Deletes the shift; its signups go with it (ON DELETE CASCADE)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM shifts WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(max_volunteers: i32) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            title: "Holiday bag packing".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 12, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            location: "Brentwood Industrial Court".to_string(),
            description: "Pack 200+ holiday bags".to_string(),
            max_volunteers,
            created_by: "principal@froebel.org".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(ShiftWithCount {
            shift: shift(8),
            spots_filled: 1,
        })
        .unwrap();

        assert_eq!(json["title"], "Holiday bag packing");
        assert_eq!(json["date"], "2025-12-06");
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "12:30");
        assert_eq!(json["maxVolunteers"], 8);
        assert_eq!(json["spotsFilled"], 1);
    }
}
