//! Rows read when publishing a timetable.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::weeks::AcademicWeek;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TimetableRow {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub week_id: Option<Uuid>,
    pub title: Option<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PromotionRow {
    pub id: Uuid,
    pub name: String,
    pub delegate_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StudentRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl StudentRow {
    /// Trimmed email address, `None` when missing or blank.
    pub fn contact_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// One course session flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SessionLine {
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub course_name: String,
    pub course_code: Option<String>,
    pub teacher_name: Option<String>,
    pub classroom_name: Option<String>,
}

/// Everything the notifier needs about a published timetable.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationContext {
    pub timetable: TimetableRow,
    pub promotion: PromotionRow,
    pub delegate: Option<StudentRow>,
    pub week: Option<AcademicWeek>,
    /// Ordered by date, then slot start time.
    pub sessions: Vec<SessionLine>,
}
