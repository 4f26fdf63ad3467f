//! Persistence for `academic_weeks`.
//!
//! [`WeekRepository`] is the seam the generator talks to; [`PgWeekStore`]
//! is the PostgreSQL implementation. Both write paths run in a single
//! transaction so readers never observe a half-regenerated year or a
//! cleared-but-not-yet-set current flag.

use chrono::NaiveDate;
use sqlx::PgPool;
use timetable_core::WeekSpan;

use super::types::AcademicWeek;

#[derive(Debug, thiserror::Error)]
pub enum WeekStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait WeekRepository: Send + Sync {
    /// Make the stored weeks of `year` equal to `weeks`.
    ///
    /// Rows are upserted on `(sequence_number, year)` with `is_current`
    /// reset, then rows numbered beyond `weeks.len()` are deleted.
    /// Returns the number of deleted rows.
    async fn sync_year(&self, year: i32, weeks: &[WeekSpan]) -> Result<u64, WeekStoreError>;

    /// Clear every current flag, then flag the first week (by year, then
    /// sequence number) containing `today`.
    async fn refresh_current(&self, today: NaiveDate) -> Result<Option<AcademicWeek>, WeekStoreError>;

    /// Weeks of `year` ordered by sequence number.
    async fn list_year(&self, year: i32) -> Result<Vec<AcademicWeek>, WeekStoreError>;

    /// First week containing `day`, without touching any flag.
    async fn find_containing(&self, day: NaiveDate) -> Result<Option<AcademicWeek>, WeekStoreError>;
}

const WEEK_COLUMNS: &str = "id, sequence_number, start_date, end_date, year, is_current";

/// PostgreSQL-backed week store. Cloning shares the pool.
#[derive(Clone)]
pub struct PgWeekStore {
    pool: PgPool,
}

impl PgWeekStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WeekRepository for PgWeekStore {
    async fn sync_year(&self, year: i32, weeks: &[WeekSpan]) -> Result<u64, WeekStoreError> {
        let sequence_numbers: Vec<i32> = weeks.iter().map(|w| w.sequence_number).collect();
        let start_dates: Vec<NaiveDate> = weeks.iter().map(|w| w.start_date).collect();
        let end_dates: Vec<NaiveDate> = weeks.iter().map(|w| w.end_date).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO academic_weeks (sequence_number, start_date, end_date, year, is_current)
             SELECT seq, start_date, end_date, $4, FALSE
             FROM UNNEST($1::int4[], $2::date[], $3::date[]) AS w(seq, start_date, end_date)
             ON CONFLICT (sequence_number, year) DO UPDATE
             SET start_date = EXCLUDED.start_date,
                 end_date   = EXCLUDED.end_date,
                 is_current = FALSE,
                 updated_at = now()",
        )
        .bind(&sequence_numbers)
        .bind(&start_dates)
        .bind(&end_dates)
        .bind(year)
        .execute(&mut *tx)
        .await?;

        let pruned = sqlx::query(
            "DELETE FROM academic_weeks WHERE year = $1 AND sequence_number > $2",
        )
        .bind(year)
        .bind(weeks.len() as i32)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(pruned)
    }

    async fn refresh_current(&self, today: NaiveDate) -> Result<Option<AcademicWeek>, WeekStoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE academic_weeks SET is_current = FALSE, updated_at = now() WHERE is_current")
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, AcademicWeek>(&format!(
            "UPDATE academic_weeks SET is_current = TRUE, updated_at = now()
             WHERE id = (
                 SELECT id FROM academic_weeks
                 WHERE $1 BETWEEN start_date AND end_date
                 ORDER BY year, sequence_number
                 LIMIT 1
             )
             RETURNING {WEEK_COLUMNS}"
        ))
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(current)
    }

    async fn list_year(&self, year: i32) -> Result<Vec<AcademicWeek>, WeekStoreError> {
        let rows = sqlx::query_as::<_, AcademicWeek>(&format!(
            "SELECT {WEEK_COLUMNS} FROM academic_weeks WHERE year = $1 ORDER BY sequence_number"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_containing(&self, day: NaiveDate) -> Result<Option<AcademicWeek>, WeekStoreError> {
        let row = sqlx::query_as::<_, AcademicWeek>(&format!(
            "SELECT {WEEK_COLUMNS} FROM academic_weeks
             WHERE $1 BETWEEN start_date AND end_date
             ORDER BY year, sequence_number
             LIMIT 1"
        ))
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
