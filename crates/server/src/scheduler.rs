//! Cron-driven weekly refresh of the current academic week.
//!
//! Refreshes once at startup, then sleeps until each fire time of the
//! configured expression (local time).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tracing::{info, warn};

use crate::weeks::{self, WeekRepository};

/// Parse a cron expression, auto-prepending "0 " for 5-field expressions.
///
/// The `cron` crate requires 6 fields (sec min hr dom mon dow), while the
/// configured expression is usually the classic 5-field form.
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() == 5 {
        Schedule::from_str(&format!("0 {}", expr))
    } else {
        Schedule::from_str(expr)
    }
}

/// Next fire time strictly after `now`, with the delay until it.
pub fn next_fire<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<(DateTime<Tz>, Duration)> {
    let next = schedule.after(now).next()?;
    let delay = (next.clone() - now.clone()).to_std().unwrap_or(Duration::ZERO);
    Some((next, delay))
}

/// Run the week scheduler until the task is dropped.
pub async fn run_week_scheduler(repo: Arc<dyn WeekRepository>, schedule: Schedule) {
    info!("week scheduler started");
    refresh(repo.as_ref()).await;

    loop {
        let Some((next, delay)) = next_fire(&schedule, &Local::now()) else {
            warn!("week scheduler: cron expression has no upcoming fire time, stopping");
            return;
        };
        info!(next_run = %next, "week scheduler: sleeping until next run");
        tokio::time::sleep(delay).await;
        refresh(repo.as_ref()).await;
    }
}

async fn refresh(repo: &dyn WeekRepository) {
    if let Err(e) = weeks::update_current_week_status(repo, weeks::today()).await {
        warn!(error = %e, "week scheduler: current week update failed");
    }
}
