//! Row builders shared by the database tests

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use super::shift::{Shift, ShiftFields};
use super::signup::{NewSignup, SignupKind, SCHOOL_LOCATION};
use super::user::{CreateUserData, User, ROLE_VOLUNTEER};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub async fn volunteer(pool: &PgPool, email: &str) -> User {
    User::create(
        pool,
        CreateUserData {
            email: email.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: ROLE_VOLUNTEER.to_string(),
        },
    )
    .await
    .unwrap()
}

/// A three hour warehouse shift starting at `start`
pub async fn warehouse_shift(
    pool: &PgPool,
    on: NaiveDate,
    start: NaiveTime,
    max_volunteers: i32,
) -> Shift {
    let fields = ShiftFields {
        title: "Book sorting".to_string(),
        date: on,
        start_time: start,
        end_time: start + chrono::Duration::hours(3),
        location: "Warehouse".to_string(),
        description: "Sort donated books".to_string(),
        max_volunteers,
    };
    Shift::create(pool, &fields, "principal@froebel.org")
        .await
        .unwrap()
}

fn signup_for(user: &User, kind: SignupKind) -> NewSignup {
    NewSignup {
        user_id: user.id,
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: user.email.clone(),
        phone_number: "314-555-0199".to_string(),
        shift_id: None,
        date: date(2030, 1, 1),
        start_time: time(9, 0),
        end_time: time(12, 0),
        grade_preference: None,
        organization: None,
        location: SCHOOL_LOCATION.to_string(),
        kind,
        comments: None,
    }
}

pub fn warehouse_signup(user: &User, shift: &Shift) -> NewSignup {
    NewSignup {
        shift_id: Some(shift.id),
        date: shift.date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        location: shift.location.clone(),
        ..signup_for(user, SignupKind::Warehouse)
    }
}

pub fn school_signup(user: &User, on: NaiveDate, start: NaiveTime, end: NaiveTime) -> NewSignup {
    NewSignup {
        date: on,
        start_time: start,
        end_time: end,
        ..signup_for(user, SignupKind::School)
    }
}

pub fn unknown_shift() -> Uuid {
    Uuid::new_v4()
}
