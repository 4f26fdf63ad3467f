//! Academic week generation and current-week tracking.
//!
//! Planning is pure (`timetable_core::calendar`); this module applies plans
//! through a [`WeekRepository`] and reports what happened.

mod store;
mod types;


use chrono::NaiveDate;
use tracing::{info, warn};

use timetable_core::{calendar, TimetableError, WeekSpan};

pub use store::{PgWeekStore, WeekRepository, WeekStoreError};
pub use types::{AcademicWeek, CurrentWeekResponse, GenerationReport};

#[derive(Debug, thiserror::Error)]
pub enum WeekError {
    #[error(transparent)]
    Calendar(#[from] TimetableError),

    #[error(transparent)]
    Store(#[from] WeekStoreError),
}

/// Local calendar date, the day granularity every "today" comparison uses.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Plan and persist every week of academic year `year`.
pub async fn generate(
    repo: &dyn WeekRepository,
    year: i32,
    explicit_start: Option<NaiveDate>,
) -> Result<GenerationReport, WeekError> {
    let plan = calendar::plan_weeks(year, explicit_start)?;
    let report = apply_plan(repo, year, &plan).await?;
    Ok(report)
}

/// Persist an already validated plan for `year`.
pub async fn apply_plan(
    repo: &dyn WeekRepository,
    year: i32,
    plan: &[WeekSpan],
) -> Result<GenerationReport, WeekStoreError> {
    info!(year, weeks = plan.len(), "generating academic weeks");

    let pruned = repo.sync_year(year, plan).await?;

    let report = GenerationReport {
        year,
        generated: plan.len(),
        pruned,
        first_week: plan.first().copied(),
        last_week: plan.last().copied(),
    };

    info!(
        year,
        generated = report.generated,
        pruned = report.pruned,
        first_start = ?report.first_week.map(|w| w.start_date),
        last_end = ?report.last_week.map(|w| w.end_date),
        "academic weeks generated"
    );

    Ok(report)
}

/// Recompute which week contains `today` and flag it current.
///
/// Finding no week is a normal outcome, logged as a warning.
pub async fn update_current_week_status(
    repo: &dyn WeekRepository,
    today: NaiveDate,
) -> Result<Option<AcademicWeek>, WeekStoreError> {
    let current = repo.refresh_current(today).await?;

    match &current {
        Some(week) => info!(
            week_id = %week.id,
            year = week.year,
            sequence_number = week.sequence_number,
            start = %week.start_date,
            end = %week.end_date,
            "current week updated"
        ),
        None => warn!(%today, "no current week found"),
    }

    Ok(current)
}
