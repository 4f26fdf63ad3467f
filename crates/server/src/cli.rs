//! CLI argument parsing and one-shot subcommands.

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use timetable_core::{calendar, Config};

use crate::publication::{self, NotifyOutcome, PgPublicationStore};
use crate::weeks::{self, PgWeekStore};
use crate::{app_config, db};

/// School timetable service: academic weeks and timetable publication.
#[derive(Parser, Debug)]
#[command(name = "timetable-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API and the weekly current-week scheduler.
    Serve,

    /// Generate the weeks of an academic year, or refresh the current week.
    GenerateWeeks {
        /// Academic year starting in September (defaults to the year of
        /// `--start-date`, else the current calendar year).
        #[arg(long)]
        year: Option<i32>,

        /// First day to plan from, YYYY-MM-DD (defaults to September 1).
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Flag the week containing today instead of generating.
        #[arg(long, conflicts_with_all = ["year", "start_date"])]
        update_current: bool,
    },

    /// Publish a timetable and email it to the promotion delegate.
    Publish {
        timetable_id: Uuid,
    },
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    db::init_pg_pool(&config.postgres)
        .await
        .ok_or_else(|| anyhow::anyhow!("PostgreSQL is not configured or unreachable"))
}

/// Academic year to generate when `--year` is omitted: the one containing
/// `--start-date`, else the calendar year of `today`.
pub(crate) fn resolve_year(year: Option<i32>, start_date: Option<NaiveDate>, today: NaiveDate) -> i32 {
    match (year, start_date) {
        (Some(year), _) => year,
        (None, Some(start)) => calendar::academic_year_of(start),
        (None, None) => today.year(),
    }
}

pub async fn generate_weeks(
    config: &Config,
    year: Option<i32>,
    start_date: Option<NaiveDate>,
    update_current: bool,
) -> anyhow::Result<()> {
    let store = PgWeekStore::new(connect(config).await?);

    if update_current {
        match weeks::update_current_week_status(&store, weeks::today()).await? {
            Some(week) => println!(
                "Current week: {} of {}-{} ({} to {})",
                week.sequence_number,
                week.year,
                week.year + 1,
                week.start_date,
                week.end_date
            ),
            None => println!("No current week"),
        }
        return Ok(());
    }

    let year = resolve_year(year, start_date, weeks::today());
    let report = weeks::generate(&store, year, start_date).await?;
    println!(
        "Generated {} weeks for {}-{} ({} stale weeks removed)",
        report.generated,
        report.year,
        report.year + 1,
        report.pruned
    );
    Ok(())
}

pub async fn publish(config: &Config, timetable_id: Uuid) -> anyhow::Result<()> {
    let store = PgPublicationStore::new(connect(config).await?);
    let publisher = app_config::build_publisher(config);

    let (ctx, outcome) = publication::publish_and_notify(&store, &publisher, timetable_id).await?;
    println!(
        "Published timetable {} for {}",
        ctx.timetable.id, ctx.promotion.name
    );
    match outcome {
        NotifyOutcome::Delivered { recipient } => println!("Emailed to {recipient}"),
        NotifyOutcome::Skipped(reason) => println!("Email skipped: {reason:?}"),
        NotifyOutcome::Failed(message) => println!("Email failed: {message}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_weeks_flags() {
        let cli = Cli::try_parse_from([
            "timetable-server",
            "generate-weeks",
            "--year",
            "2025",
            "--start-date",
            "2025-09-01",
        ])
        .unwrap();
        match cli.command {
            Command::GenerateWeeks {
                year,
                start_date,
                update_current,
            } => {
                assert_eq!(year, Some(2025));
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2025, 9, 1));
                assert!(!update_current);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn start_date_alone_selects_its_academic_year() {
        let cli = Cli::try_parse_from([
            "timetable-server",
            "generate-weeks",
            "--start-date",
            "2025-09-01",
        ])
        .unwrap();
        let Command::GenerateWeeks { year, start_date, .. } = cli.command else {
            panic!("expected generate-weeks");
        };

        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let year = resolve_year(year, start_date, today);
        assert_eq!(year, 2025);

        let weeks = calendar::plan_weeks(year, start_date).unwrap();
        assert_eq!(weeks[0].start_date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(weeks[0].end_date, NaiveDate::from_ymd_opt(2025, 9, 7).unwrap());
    }

    #[test]
    fn year_defaults_follow_the_given_options() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let january = NaiveDate::from_ymd_opt(2026, 1, 5);
        assert_eq!(resolve_year(None, january, today), 2025);
        assert_eq!(resolve_year(Some(2026), january, today), 2026);
        assert_eq!(resolve_year(None, None, today), 2026);
    }

    #[test]
    fn malformed_start_date_is_rejected() {
        let err = Cli::try_parse_from([
            "timetable-server",
            "generate-weeks",
            "--start-date",
            "01/09/2025",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn update_current_conflicts_with_year() {
        let result = Cli::try_parse_from([
            "timetable-server",
            "generate-weeks",
            "--update-current",
            "--year",
            "2025",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn publish_takes_a_uuid() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["timetable-server", "publish", id.to_string().as_str()]).unwrap();
        assert!(matches!(cli.command, Command::Publish { timetable_id } if timetable_id == id));
        assert!(Cli::try_parse_from(["timetable-server", "publish", "42"]).is_err());
    }
}
