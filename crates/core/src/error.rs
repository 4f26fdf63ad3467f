use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimetableError {
    #[error("Invalid academic year {0}: must be between {min} and {max}", min = crate::calendar::MIN_YEAR, max = crate::calendar::MAX_YEAR)]
    InvalidYear(i32),

    #[error("Start date {start} is outside the academic year {year}-{next} window", next = .year + 1)]
    StartDateOutOfRange { start: NaiveDate, year: i32 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
