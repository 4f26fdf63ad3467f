use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use timetable_core::config::PostgresConfig;

/// Create a PostgreSQL connection pool and run migrations.
/// Returns None if PostgreSQL is not configured or unreachable.
pub async fn init_pg_pool(config: &PostgresConfig) -> Option<PgPool> {
    if !config.is_configured() {
        warn!("PostgreSQL not configured (set DATABASE_URL or PG_USERNAME), week storage disabled");
        return None;
    }

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, host = %config.host, "failed to connect to PostgreSQL");
            return None;
        }
    };
    info!(host = %config.host, database = %config.database, "PostgreSQL connected");

    match sqlx::migrate!("../../migrations").run(&pool).await {
        Ok(()) => {
            info!("database migrations applied");
            Some(pool)
        }
        Err(e) => {
            warn!(error = %e, "failed to run migrations");
            None
        }
    }
}
