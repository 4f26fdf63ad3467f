use std::sync::Arc;

use sqlx::PgPool;
use timetable_core::Config;

use crate::publication::PublicationNotifier;

pub struct AppState {
    pub config: Config,
    /// `None` when PostgreSQL is not configured; dependent endpoints answer 503.
    pub pg_pool: Option<PgPool>,
    pub publisher: Arc<PublicationNotifier>,
}
