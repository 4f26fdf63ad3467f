//! Persisted week rows and generation reports.

use chrono::NaiveDate;
use serde::Serialize;
use timetable_core::WeekSpan;
use uuid::Uuid;

/// One row of `academic_weeks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AcademicWeek {
    pub id: Uuid,
    pub sequence_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub year: i32,
    pub is_current: bool,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub year: i32,
    pub generated: usize,
    /// Rows of the year beyond the new week count that were deleted.
    pub pruned: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_week: Option<WeekSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_week: Option<WeekSpan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeekResponse {
    pub current: Option<AcademicWeek>,
}
