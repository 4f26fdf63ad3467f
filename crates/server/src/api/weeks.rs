//! Academic week endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use timetable_core::calendar;

use crate::state::AppState;
use crate::weeks::{self, AcademicWeek, CurrentWeekResponse, GenerationReport, PgWeekStore, WeekRepository};

use super::common::{bad_request, internal_error, not_found, require_pg, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ListWeeksQuery {
    /// Defaults to the academic year containing today.
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub year: i32,
    pub start_date: Option<NaiveDate>,
}

pub async fn list_weeks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListWeeksQuery>,
) -> ApiResult<Json<Vec<AcademicWeek>>> {
    let pool = require_pg(&state)?;
    let year = query
        .year
        .unwrap_or_else(|| calendar::academic_year_of(weeks::today()));

    let rows = PgWeekStore::new(pool.clone())
        .list_year(year)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}

/// Week containing today, derived from dates rather than the stored flag.
pub async fn current_week(State(state): State<Arc<AppState>>) -> ApiResult<Json<AcademicWeek>> {
    let pool = require_pg(&state)?;
    let today = weeks::today();

    PgWeekStore::new(pool.clone())
        .find_containing(today)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("academic week for date", today))
}

pub async fn generate_weeks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<GenerationReport>> {
    let plan = calendar::plan_weeks(req.year, req.start_date).map_err(|e| bad_request(e.to_string()))?;
    let pool = require_pg(&state)?;

    let store = PgWeekStore::new(pool.clone());
    let report = weeks::apply_plan(&store, req.year, &plan)
        .await
        .map_err(internal_error)?;
    Ok(Json(report))
}

pub async fn refresh_current_week(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CurrentWeekResponse>> {
    let pool = require_pg(&state)?;

    let store = PgWeekStore::new(pool.clone());
    let current = weeks::update_current_week_status(&store, weeks::today())
        .await
        .map_err(internal_error)?;
    Ok(Json(CurrentWeekResponse { current }))
}
