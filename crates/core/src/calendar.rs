//! Academic calendar arithmetic.
//!
//! An academic year `Y` runs from September 1 of `Y` to August 31 of `Y + 1`.
//! [`plan_weeks`] tiles that span with Monday-to-Sunday weeks numbered from 1;
//! only the final week may end early, clipped to August 31.
//!
//! Everything here is pure: persistence and "today" are supplied by callers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::TimetableError;

/// Lowest academic year accepted by the planner.
pub const MIN_YEAR: i32 = 1970;
/// Highest academic year accepted by the planner.
pub const MAX_YEAR: i32 = 2999;

const ACADEMIC_START_MONTH: u32 = 9;
const ACADEMIC_END_MONTH: u32 = 8;
const ACADEMIC_END_DAY: u32 = 31;

/// One planned week of an academic year, not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekSpan {
    /// 1-based position within the academic year.
    pub sequence_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Academic year the week belongs to (the September year).
    pub year: i32,
}

impl WeekSpan {
    /// Inclusive containment at day granularity.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

fn check_year(year: i32) -> Result<(), TimetableError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(TimetableError::InvalidYear(year))
    }
}

/// September 1 of `year`.
pub fn academic_year_start(year: i32) -> Result<NaiveDate, TimetableError> {
    check_year(year)?;
    NaiveDate::from_ymd_opt(year, ACADEMIC_START_MONTH, 1)
        .ok_or_else(|| TimetableError::InvalidDate(format!("{year}-09-01")))
}

/// August 31 of `year + 1`, the last day any week of `year` may cover.
pub fn academic_year_end(year: i32) -> Result<NaiveDate, TimetableError> {
    check_year(year)?;
    NaiveDate::from_ymd_opt(year + 1, ACADEMIC_END_MONTH, ACADEMIC_END_DAY)
        .ok_or_else(|| TimetableError::InvalidDate(format!("{}-08-31", year + 1)))
}

/// Academic year a calendar day falls in (September onwards belongs to the
/// year it starts in).
pub fn academic_year_of(day: NaiveDate) -> i32 {
    if day.month() >= ACADEMIC_START_MONTH {
        day.year()
    } else {
        day.year() - 1
    }
}

/// Monday the first week starts on.
///
/// A weekend date moves forward to the following Monday; any weekday snaps
/// back to the Monday of its own week.
pub fn first_monday(start: NaiveDate) -> NaiveDate {
    let start = match start.weekday() {
        Weekday::Sat => start + Duration::days(2),
        Weekday::Sun => start + Duration::days(1),
        _ => start,
    };
    start - Duration::days(i64::from(start.weekday().num_days_from_monday()))
}

/// Check that an explicit start date is plausibly meant for `year`.
///
/// Accepted window: January 1 of `year` through August 31 of `year + 1`.
pub fn validate_start_date(year: i32, start: NaiveDate) -> Result<(), TimetableError> {
    let earliest = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| TimetableError::InvalidDate(format!("{year}-01-01")))?;
    let latest = academic_year_end(year)?;
    if start < earliest || start > latest {
        return Err(TimetableError::StartDateOutOfRange { start, year });
    }
    Ok(())
}

/// Plan every week of academic year `year`.
///
/// The first week starts on the Monday derived from `explicit_start`
/// (or September 1 when absent) via [`first_monday`]. Weeks advance by
/// seven days until the next start would pass August 31 of `year + 1`.
pub fn plan_weeks(
    year: i32,
    explicit_start: Option<NaiveDate>,
) -> Result<Vec<WeekSpan>, TimetableError> {
    let start = match explicit_start {
        Some(date) => {
            check_year(year)?;
            validate_start_date(year, date)?;
            date
        }
        None => academic_year_start(year)?,
    };
    let end = academic_year_end(year)?;

    let mut weeks = Vec::with_capacity(53);
    let mut monday = first_monday(start);
    let mut sequence_number = 0;

    while monday <= end {
        sequence_number += 1;
        let sunday = monday + Duration::days(6);
        weeks.push(WeekSpan {
            sequence_number,
            start_date: monday,
            end_date: sunday.min(end),
            year,
        });
        monday += Duration::days(7);
    }

    Ok(weeks)
}

/// First week containing `today`, in iteration order.
pub fn find_current<'a, I>(weeks: I, today: NaiveDate) -> Option<&'a WeekSpan>
where
    I: IntoIterator<Item = &'a WeekSpan>,
{
    weeks.into_iter().find(|w| w.contains(today))
}
