//! Timetable publication: flag the timetable published, then mail it.

mod notifier;
mod pdf;
mod store;
mod types;

use tracing::info;
use uuid::Uuid;

pub use notifier::{NotifyOutcome, PublicationNotifier, SkipReason};
pub use store::{PgPublicationStore, PublicationError, PublicationRepository};
pub use types::{PromotionRow, PublicationContext, TimetableRow};

/// Mark `timetable_id` published and load what the notifier needs.
pub async fn publish(
    repo: &dyn PublicationRepository,
    timetable_id: Uuid,
) -> Result<PublicationContext, PublicationError> {
    let timetable = repo
        .mark_published(timetable_id)
        .await?
        .ok_or(PublicationError::NotFound(timetable_id))?;

    info!(%timetable_id, promotion_id = %timetable.promotion_id, "timetable published");

    repo.load_context(timetable).await
}

/// Publish, then notify inline. Notification problems only show up in the outcome.
pub async fn publish_and_notify(
    repo: &dyn PublicationRepository,
    publisher: &PublicationNotifier,
    timetable_id: Uuid,
) -> Result<(PublicationContext, NotifyOutcome), PublicationError> {
    let ctx = publish(repo, timetable_id).await?;
    let outcome = publisher.notify(&ctx).await;
    Ok((ctx, outcome))
}
