//! Timetable publication endpoint.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::publication::{self, PgPublicationStore, PublicationError, TimetableRow};
use crate::state::AppState;

use super::common::{internal_error, not_found, require_pg, ApiResult};

/// Publish a timetable. The delegate email is sent in the background.
pub async fn publish_timetable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TimetableRow>> {
    let pool = require_pg(&state)?;

    let store = PgPublicationStore::new(pool.clone());
    let ctx = publication::publish(&store, id).await.map_err(|e| match e {
        PublicationError::NotFound(id) => not_found("timetable", id),
        other => internal_error(other),
    })?;

    let timetable = ctx.timetable.clone();
    let publisher = state.publisher.clone();
    tokio::spawn(async move {
        publisher.notify(&ctx).await;
    });

    Ok(Json(timetable))
}
