use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::availability::{check_school_date, check_shift_date, DateRejection};
use crate::models::{
    blackout::BlackoutDate,
    shift::Shift,
    signup::{NewSignup, Signup, SignupKind, SCHOOL_LOCATION},
};

#[derive(thiserror::Error, Debug)]
pub enum SignupError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Shift not found")]
    ShiftNotFound,

    #[error("You are already signed up for this shift")]
    AlreadySignedUp,

    #[error("You are already signed up for this date")]
    AlreadySignedUpForDate,

    #[error("This shift is full")]
    ShiftFull,

    #[error("{0}")]
    DateUnavailable(#[from] DateRejection),

    #[error("Departure time must be after arrival time")]
    InvalidTimeRange,
}

/// Contact details every signup carries
#[derive(Debug, Clone)]
pub struct VolunteerContact {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default)]
pub struct SignupExtras {
    pub grade_preference: Option<String>,
    pub organization: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SchoolVisit {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Takes a seat on a warehouse shift.
///
/// Runs in one transaction holding a row lock on the shift, so two requests
/// for the last seat (or two double-clicks by one volunteer) cannot both
/// succeed. Date, times and location are copied from the shift.
#[tracing::instrument(skip(pool, contact, extras), fields(user_id = %contact.user_id))]
pub async fn sign_up_for_shift(
    pool: &PgPool,
    shift_id: Uuid,
    contact: VolunteerContact,
    extras: SignupExtras,
    today: NaiveDate,
) -> Result<Signup, SignupError> {
    let mut tx = pool.begin().await?;

    let shift = Shift::lock_for_signup(&mut *tx, shift_id)
        .await?
        .ok_or(SignupError::ShiftNotFound)?;

    let blacked_out = BlackoutDate::is_blacked_out(&mut *tx, shift.date).await?;
    check_shift_date(shift.date, today, blacked_out)?;

    if Signup::find_for_shift_and_user(&mut *tx, shift.id, contact.user_id)
        .await?
        .is_some()
    {
        return Err(SignupError::AlreadySignedUp);
    }

    let spots_filled = Signup::count_for_shift(&mut *tx, shift.id).await?;
    if spots_filled >= i64::from(shift.max_volunteers) {
        tracing::warn!(
            shift_id = %shift.id,
            spots_filled,
            max_volunteers = shift.max_volunteers,
            "Signup rejected, shift is full"
        );
        return Err(SignupError::ShiftFull);
    }

    let new_signup = NewSignup {
        user_id: contact.user_id,
        first_name: contact.first_name,
        last_name: contact.last_name,
        email: contact.email,
        phone_number: contact.phone_number,
        shift_id: Some(shift.id),
        date: shift.date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        grade_preference: extras.grade_preference,
        organization: extras.organization,
        location: shift.location.clone(),
        kind: SignupKind::Warehouse,
        comments: extras.comments,
    };

    let signup = Signup::insert(&mut *tx, &new_signup)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SignupError::AlreadySignedUp
            } else {
                SignupError::DatabaseError(e)
            }
        })?;

    tx.commit().await?;

    tracing::info!(
        signup_id = %signup.id,
        shift_id = %shift.id,
        "Volunteer signed up for warehouse shift"
    );

    Ok(signup)
}

/// Records a volunteer-declared school visit (one per volunteer per day)
#[tracing::instrument(skip(pool, contact, extras), fields(user_id = %contact.user_id))]
pub async fn register_school_visit(
    pool: &PgPool,
    visit: SchoolVisit,
    contact: VolunteerContact,
    extras: SignupExtras,
    today: NaiveDate,
) -> Result<Signup, SignupError> {
    if visit.start_time >= visit.end_time {
        return Err(SignupError::InvalidTimeRange);
    }

    let blacked_out = BlackoutDate::is_blacked_out(pool, visit.date).await?;
    check_school_date(visit.date, today, blacked_out)?;

    if Signup::school_visit_exists(pool, contact.user_id, visit.date).await? {
        return Err(SignupError::AlreadySignedUpForDate);
    }

    let new_signup = NewSignup {
        user_id: contact.user_id,
        first_name: contact.first_name,
        last_name: contact.last_name,
        email: contact.email,
        phone_number: contact.phone_number,
        shift_id: None,
        date: visit.date,
        start_time: visit.start_time,
        end_time: visit.end_time,
        grade_preference: extras.grade_preference,
        organization: extras.organization,
        location: SCHOOL_LOCATION.to_string(),
        kind: SignupKind::School,
        comments: extras.comments,
    };

    // The partial unique index on (user_id, date) settles concurrent requests
    let signup = Signup::insert(pool, &new_signup).await.map_err(|e| {
        if is_unique_violation(&e) {
            SignupError::AlreadySignedUpForDate
        } else {
            SignupError::DatabaseError(e)
        }
    })?;

    tracing::info!(signup_id = %signup.id, date = %visit.date, "Volunteer registered school visit");

    Ok(signup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{date, time, unknown_shift, volunteer, warehouse_shift};
    use crate::models::user::User;
    use sqlx::postgres::PgPoolOptions;

    fn contact() -> VolunteerContact {
        VolunteerContact {
            user_id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "314-555-0100".to_string(),
        }
    }

    #[tokio::test]
    async fn test_school_visit_rejects_inverted_times_before_touching_db() {
        // Lazy pool: any query would fail to connect
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap();

        let visit = SchoolVisit {
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };

        let result = register_school_visit(
            &pool,
            visit,
            contact(),
            SignupExtras::default(),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        )
        .await;

        assert!(matches!(result, Err(SignupError::InvalidTimeRange)));
    }

    #[test]
    fn test_date_rejection_message_passes_through() {
        let error = SignupError::from(DateRejection::BlackedOut);
        assert_eq!(error.to_string(), "Signups are not allowed on this date");
    }

    fn contact_for(user: &User) -> VolunteerContact {
        VolunteerContact {
            user_id: user.id,
            email: user.email.clone(),
            ..contact()
        }
    }

    // Tuesday; the seeded shifts fall on the following Monday
    fn today() -> NaiveDate {
        date(2030, 1, 1)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_second_signup_for_same_shift_is_rejected(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        let shift = warehouse_shift(&pool, date(2030, 1, 7), time(9, 0), 5).await;

        let signup = sign_up_for_shift(
            &pool,
            shift.id,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await
        .unwrap();
        assert_eq!(signup.kind, SignupKind::Warehouse);
        assert_eq!(signup.date, shift.date);
        assert_eq!(signup.location, shift.location);

        let again = sign_up_for_shift(
            &pool,
            shift.id,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(again, Err(SignupError::AlreadySignedUp)));
        assert_eq!(Signup::count_for_shift(&pool, shift.id).await.unwrap(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_full_shift_turns_away_next_volunteer(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        let ada = volunteer(&pool, "ada@example.com").await;
        let shift = warehouse_shift(&pool, date(2030, 1, 7), time(9, 0), 1).await;

        sign_up_for_shift(
            &pool,
            shift.id,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await
        .unwrap();

        let result = sign_up_for_shift(
            &pool,
            shift.id,
            contact_for(&ada),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(result, Err(SignupError::ShiftFull)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_last_seat_goes_to_one_of_two_concurrent_requests(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        let ada = volunteer(&pool, "ada@example.com").await;
        let shift = warehouse_shift(&pool, date(2030, 1, 7), time(9, 0), 1).await;

        let (first, second) = tokio::join!(
            sign_up_for_shift(
                &pool,
                shift.id,
                contact_for(&grace),
                SignupExtras::default(),
                today(),
            ),
            sign_up_for_shift(
                &pool,
                shift.id,
                contact_for(&ada),
                SignupExtras::default(),
                today(),
            ),
        );

        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        assert_eq!(Signup::count_for_shift(&pool, shift.id).await.unwrap(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_blacked_out_shift_date_is_rejected(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        let shift = warehouse_shift(&pool, date(2030, 1, 7), time(9, 0), 5).await;
        BlackoutDate::add(&pool, shift.date).await.unwrap();

        let result = sign_up_for_shift(
            &pool,
            shift.id,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(
            result,
            Err(SignupError::DateUnavailable(DateRejection::BlackedOut))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_shift(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;

        let result = sign_up_for_shift(
            &pool,
            unknown_shift(),
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(result, Err(SignupError::ShiftNotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_second_school_visit_on_same_day_is_rejected(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        let morning = SchoolVisit {
            date: date(2030, 1, 7),
            start_time: time(8, 0),
            end_time: time(10, 0),
        };
        let afternoon = SchoolVisit {
            start_time: time(13, 0),
            end_time: time(15, 0),
            ..morning.clone()
        };

        let signup = register_school_visit(
            &pool,
            morning,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await
        .unwrap();
        assert_eq!(signup.kind, SignupKind::School);
        assert_eq!(signup.location, SCHOOL_LOCATION);
        assert!(signup.shift_id.is_none());

        let result = register_school_visit(
            &pool,
            afternoon,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(result, Err(SignupError::AlreadySignedUpForDate)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_school_visit_on_blackout_date(pool: PgPool) {
        let grace = volunteer(&pool, "grace@example.com").await;
        BlackoutDate::add(&pool, date(2030, 1, 7)).await.unwrap();

        let visit = SchoolVisit {
            date: date(2030, 1, 7),
            start_time: time(8, 0),
            end_time: time(10, 0),
        };
        let result = register_school_visit(
            &pool,
            visit,
            contact_for(&grace),
            SignupExtras::default(),
            today(),
        )
        .await;
        assert!(matches!(
            result,
            Err(SignupError::DateUnavailable(DateRejection::BlackedOut))
        ));
    }
}
