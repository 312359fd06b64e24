use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{
    progress_percent, ProgressRecord, ProgressTarget, ProgressWithContent, RecordProgress,
};

const PROGRESS_COLUMNS: &str = "id, enrollment_id, lesson_id, module_id, status, completed_at, time_spent_seconds, created_at, updated_at";

pub struct ProgressRepository;

impl ProgressRepository {
    /// Upserts one progress row by its natural key and recomputes the
    /// enrollment's `progress_percent`, all inside a single transaction.
    /// The enrollment row is locked first so concurrent completions of
    /// different lessons on the same enrollment serialize and the percent
    /// never under- or double-counts.
    pub async fn record(
        pool: &PgPool,
        input: &RecordProgress,
        target: ProgressTarget,
    ) -> Result<(ProgressRecord, i32), DatabaseError> {
        let enrollment_id = input.enrollment_id;
        let time_spent_seconds = input.time_spent_seconds.unwrap_or(0);

        let mut tx = pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM enrollments WHERE id = $1 FOR UPDATE")
                .bind(enrollment_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(DatabaseError::NotFound);
        }

        let existing = Self::find_by_target(&mut tx, enrollment_id, target).await?;

        let record = match existing {
            // Status replaced, time accumulated, completion timestamp
            // refreshed.
            Some(existing) => {
                sqlx::query_as::<_, ProgressRecord>(&format!(
                    r#"
                    UPDATE progress
                    SET status = $2,
                        time_spent_seconds = time_spent_seconds + $3,
                        completed_at = NOW(),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {PROGRESS_COLUMNS}
                    "#
                ))
                .bind(existing.id)
                .bind(input.status)
                .bind(time_spent_seconds)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProgressRecord>(&format!(
                    r#"
                    INSERT INTO progress (enrollment_id, lesson_id, module_id, status, completed_at, time_spent_seconds)
                    VALUES ($1, $2, $3, $4,
                            CASE WHEN $4 = 'completed'::progress_status THEN NOW() END,
                            $5)
                    RETURNING {PROGRESS_COLUMNS}
                    "#
                ))
                .bind(enrollment_id)
                .bind(input.lesson_id)
                .bind(input.module_id)
                .bind(input.status)
                .bind(time_spent_seconds)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        // Denominator is the set of rows that exist right now, not the
        // curriculum's lesson count.
        let (completed_count, total_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'completed'), COUNT(*)
            FROM progress
            WHERE enrollment_id = $1
            "#,
        )
        .bind(enrollment_id)
        .fetch_one(&mut *tx)
        .await?;

        let percent = progress_percent(completed_count, total_count);

        sqlx::query("UPDATE enrollments SET progress_percent = $2 WHERE id = $1")
            .bind(enrollment_id)
            .bind(percent)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((record, percent))
    }

    async fn find_by_target(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: Uuid,
        target: ProgressTarget,
    ) -> Result<Option<ProgressRecord>, DatabaseError> {
        let record = match target {
            ProgressTarget::Lesson(lesson_id) => {
                sqlx::query_as::<_, ProgressRecord>(&format!(
                    r#"
                    SELECT {PROGRESS_COLUMNS}
                    FROM progress
                    WHERE enrollment_id = $1 AND lesson_id = $2
                    "#
                ))
                .bind(enrollment_id)
                .bind(lesson_id)
                .fetch_optional(&mut **tx)
                .await?
            }
            ProgressTarget::Module(module_id) => {
                sqlx::query_as::<_, ProgressRecord>(&format!(
                    r#"
                    SELECT {PROGRESS_COLUMNS}
                    FROM progress
                    WHERE enrollment_id = $1 AND module_id = $2 AND lesson_id IS NULL
                    "#
                ))
                .bind(enrollment_id)
                .bind(module_id)
                .fetch_optional(&mut **tx)
                .await?
            }
        };

        Ok(record)
    }

    pub async fn list_for_enrollment(
        pool: &PgPool,
        enrollment_id: Uuid,
    ) -> Result<Vec<ProgressWithContent>, DatabaseError> {
        let records = sqlx::query_as::<_, ProgressWithContent>(
            r#"
            SELECT p.id, p.enrollment_id, p.lesson_id, p.module_id, p.status,
                   p.completed_at, p.time_spent_seconds,
                   l.title AS lesson_title, m.title AS module_title
            FROM progress p
            LEFT JOIN lessons l ON l.id = p.lesson_id
            LEFT JOIN course_modules m ON m.id = p.module_id
            WHERE p.enrollment_id = $1
            ORDER BY p.completed_at DESC NULLS LAST, p.updated_at DESC
            "#,
        )
        .bind(enrollment_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
