use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;
use uuid::Uuid;

use crate::domain::{pagination::PageParams, time_format};

pub const SCHOOL_LOCATION: &str = "Froebel School";
pub const SCHOOL_SHIFT_TITLE: &str = "My Custom Shift";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupKind {
    /// A seat on an admin-scheduled warehouse shift
    #[default]
    Warehouse,
    /// A volunteer-declared school visit
    School,
}

impl SignupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignupKind::Warehouse => "warehouse",
            SignupKind::School => "school",
        }
    }
}

impl fmt::Display for SignupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown signup kind: {0}")]
pub struct UnknownSignupKind(pub String);

impl TryFrom<String> for SignupKind {
    type Error = UnknownSignupKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "warehouse" => Ok(SignupKind::Warehouse),
            "school" => Ok(SignupKind::School),
            _ => Err(UnknownSignupKind(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub shift_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    pub grade_preference: Option<String>,
    pub organization: Option<String>,
    pub location: String,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub kind: SignupKind,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSignup {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub shift_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grade_preference: Option<String>,
    pub organization: Option<String>,
    pub location: String,
    pub kind: SignupKind,
    pub comments: Option<String>,
}

/// One entry of a volunteer's schedule: either a warehouse shift they hold
/// a seat on, or a school visit they declared
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MyShift {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    pub location: String,
    pub description: Option<String>,
    pub max_volunteers: Option<i32>,
    pub spots_filled: Option<i64>,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub kind: SignupKind,
}

// Warehouse rows carry the shift id and live count; school rows carry the
// signup id and no capacity.
const MY_SHIFTS_UNION: &str = r#"
    SELECT s.id, s.title, s.date, s.start_time, s.end_time, s.location,
           s.description AS description,
           s.max_volunteers AS max_volunteers,
           (SELECT COUNT(*) FROM signups c WHERE c.shift_id = s.id) AS spots_filled,
           'warehouse' AS kind
    FROM signups g
    JOIN shifts s ON s.id = g.shift_id
    WHERE g.user_id = $1 AND g.kind = 'warehouse' AND s.date >= $2
    UNION ALL
    SELECT g.id, 'My Custom Shift', g.date, g.start_time, g.end_time, g.location,
           g.comments,
           NULL::INTEGER,
           NULL::BIGINT,
           'school'
    FROM signups g
    WHERE g.user_id = $1 AND g.kind = 'school' AND g.date >= $2
"#;

impl Signup {
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        data: &NewSignup,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO signups
                (user_id, first_name, last_name, email, phone_number, shift_id, date,
                 start_time, end_time, grade_preference, organization, location, kind, comments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone_number)
        .bind(data.shift_id)
        .bind(data.date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.grade_preference)
        .bind(&data.organization)
        .bind(&data.location)
        .bind(data.kind.as_str())
        .bind(&data.comments)
        .fetch_one(executor)
        .await
    }

    pub async fn find_for_shift_and_user<'e>(
        executor: impl PgExecutor<'e>,
        shift_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM signups WHERE shift_id = $1 AND user_id = $2
            "#,
        )
        .bind(shift_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn count_for_shift<'e>(
        executor: impl PgExecutor<'e>,
        shift_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM signups WHERE shift_id = $1
            "#,
        )
        .bind(shift_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Roster for a shift, in signup order
    pub async fn list_for_shift<'e>(
        executor: impl PgExecutor<'e>,
        shift_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM signups WHERE shift_id = $1 ORDER BY created_at ASC
            "#,
        )
        .bind(shift_id)
        .fetch_all(executor)
        .await
    }

    pub async fn school_visit_exists<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM signups WHERE user_id = $1 AND date = $2 AND kind = 'school'
            )
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// A volunteer's upcoming warehouse shifts and school visits, merged and
    /// ordered by date then start time
    pub async fn list_upcoming_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        today: NaiveDate,
        page: &PageParams,
    ) -> Result<Vec<MyShift>, sqlx::Error> {
        let query = format!(
            "SELECT * FROM ({MY_SHIFTS_UNION}) my_shifts ORDER BY date ASC, start_time ASC LIMIT $3 OFFSET $4"
        );

        sqlx::query_as::<_, MyShift>(&query)
            .bind(user_id)
            .bind(today)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await
    }

    pub async fn count_upcoming_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM ({MY_SHIFTS_UNION}) my_shifts");

        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(user_id)
            .bind(today)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}
