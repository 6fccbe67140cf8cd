use chrono::{Datelike, NaiveDate, Utc, Weekday};

/// Reason a date cannot take new signups (or a new blackout)
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRejection {
    #[error("Signups are not allowed on past dates")]
    Past,

    #[error("Weekend dates are not available for signups")]
    Weekend,

    #[error("Signups are not allowed on this date")]
    BlackedOut,
}

impl DateRejection {
    /// Short machine-readable code for API consumers
    pub fn code(&self) -> &'static str {
        match self {
            DateRejection::Past => "past",
            DateRejection::Weekend => "weekend",
            DateRejection::BlackedOut => "blackout",
        }
    }
}

/// The current calendar day, in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Checks whether a volunteer may declare a school visit on `date`.
///
/// Rules are applied in order: past dates, then weekends, then blackouts.
/// `today` itself is open.
pub fn check_school_date(
    date: NaiveDate,
    today: NaiveDate,
    blacked_out: bool,
) -> Result<(), DateRejection> {
    if date < today {
        return Err(DateRejection::Past);
    }
    if is_weekend(date) {
        return Err(DateRejection::Weekend);
    }
    if blacked_out {
        return Err(DateRejection::BlackedOut);
    }
    Ok(())
}

/// Checks whether a volunteer may join a warehouse shift held on `date`.
/// Warehouse shifts are scheduled by admins and may fall on weekends.
pub fn check_shift_date(
    date: NaiveDate,
    today: NaiveDate,
    blacked_out: bool,
) -> Result<(), DateRejection> {
    if date < today {
        return Err(DateRejection::Past);
    }
    if blacked_out {
        return Err(DateRejection::BlackedOut);
    }
    Ok(())
}

/// Blackouts only make sense on days that would otherwise be open
pub fn check_blackout_date(date: NaiveDate, today: NaiveDate) -> Result<(), DateRejection> {
    check_school_date(date, today, false)
}
