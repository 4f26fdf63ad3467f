//! Operational HTTP endpoints.

mod common;
mod health;
mod timetables;
mod weeks;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub use health::health;
pub use timetables::publish_timetable;
pub use weeks::{current_week, generate_weeks, list_weeks, refresh_current_week};
