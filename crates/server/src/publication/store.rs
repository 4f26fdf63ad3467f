//! Persistence for timetable publication.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{PromotionRow, PublicationContext, SessionLine, StudentRow, TimetableRow};
use crate::weeks::AcademicWeek;

#[derive(Debug, thiserror::Error)]
pub enum PublicationError {
    #[error("timetable {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait PublicationRepository: Send + Sync {
    /// Set `status = 'published'` and stamp `published_at`.
    /// Returns `None` for an unknown id.
    async fn mark_published(&self, id: Uuid) -> Result<Option<TimetableRow>, PublicationError>;

    /// Load the promotion, delegate, week and sessions of `timetable`.
    async fn load_context(&self, timetable: TimetableRow) -> Result<PublicationContext, PublicationError>;
}

const TIMETABLE_COLUMNS: &str = "id, promotion_id, week_id, title, status, published_at";

#[derive(Clone)]
pub struct PgPublicationStore {
    pool: PgPool,
}

impl PgPublicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PublicationRepository for PgPublicationStore {
    async fn mark_published(&self, id: Uuid) -> Result<Option<TimetableRow>, PublicationError> {
        let row = sqlx::query_as::<_, TimetableRow>(&format!(
            "UPDATE timetables SET status = 'published', published_at = now()
             WHERE id = $1
             RETURNING {TIMETABLE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn load_context(&self, timetable: TimetableRow) -> Result<PublicationContext, PublicationError> {
        let promotion = sqlx::query_as::<_, PromotionRow>(
            "SELECT id, name, delegate_id FROM promotions WHERE id = $1",
        )
        .bind(timetable.promotion_id)
        .fetch_one(&self.pool)
        .await?;

        let delegate = match promotion.delegate_id {
            Some(student_id) => {
                sqlx::query_as::<_, StudentRow>(
                    "SELECT id, first_name, last_name, email FROM students WHERE id = $1",
                )
                .bind(student_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let week = match timetable.week_id {
            Some(week_id) => {
                sqlx::query_as::<_, AcademicWeek>(
                    "SELECT id, sequence_number, start_date, end_date, year, is_current
                     FROM academic_weeks WHERE id = $1",
                )
                .bind(week_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let sessions = sqlx::query_as::<_, SessionLine>(
            "SELECT cs.session_date, ts.start_time, ts.end_time,
                    c.name AS course_name, c.code AS course_code, c.teacher_name,
                    cl.name AS classroom_name
             FROM course_sessions cs
             JOIN courses c ON c.id = cs.course_id
             JOIN time_slots ts ON ts.id = cs.time_slot_id
             LEFT JOIN classrooms cl ON cl.id = cs.classroom_id
             WHERE cs.timetable_id = $1
             ORDER BY cs.session_date, ts.start_time",
        )
        .bind(timetable.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PublicationContext {
            timetable,
            promotion,
            delegate,
            week,
            sessions,
        })
    }
}
