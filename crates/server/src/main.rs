mod api;
mod app_config;
mod cli;
mod db;
mod publication;
mod router;
mod scheduler;
mod state;
mod weeks;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use timetable_core::Config;

use crate::cli::{Cli, Command};
use crate::state::AppState;
use crate::weeks::{PgWeekStore, WeekRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = app_config::load_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config.log_summary();

    match cli.command {
        Command::Serve => serve(config).await,
        Command::GenerateWeeks {
            year,
            start_date,
            update_current,
        } => cli::generate_weeks(&config, year, start_date, update_current).await,
        Command::Publish { timetable_id } => cli::publish(&config, timetable_id).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pg_pool = db::init_pg_pool(&config.postgres).await;
    let publisher = Arc::new(app_config::build_publisher(&config));

    if !config.scheduler.enabled {
        info!("week scheduler disabled (SCHEDULER_ENABLED=false)");
    } else if let Some(pool) = pg_pool.as_ref() {
        let schedule = scheduler::parse_cron(&config.scheduler.week_cron)
            .with_context(|| format!("invalid WEEK_SCHEDULE_CRON '{}'", config.scheduler.week_cron))?;
        let repo: Arc<dyn WeekRepository> = Arc::new(PgWeekStore::new(pool.clone()));
        tokio::spawn(scheduler::run_week_scheduler(repo, schedule));
        info!(cron = %config.scheduler.week_cron, "week scheduler enabled");
    } else {
        warn!("week scheduler disabled, PostgreSQL not configured");
    }

    let addr = config.server.bind_addr();
    let state = Arc::new(AppState {
        config,
        pg_pool,
        publisher,
    });
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
