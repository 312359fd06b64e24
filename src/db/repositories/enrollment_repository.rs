use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{Enrollment, EnrollmentStatus, EnrollmentWithCourse};

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, status, progress_percent, enrolled_at, completed_at";

pub struct EnrollmentRepository;

impl EnrollmentRepository {
    /// One enrollment per (user, course); the table constraint turns a
    /// duplicate attempt into `DatabaseError::Duplicate`.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Enrollment, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            INSERT INTO enrollments (user_id, course_id)
            VALUES ($1, $2)
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await?;

        Ok(enrollment)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<EnrollmentWithCourse>, DatabaseError> {
        let enrollments = sqlx::query_as::<_, EnrollmentWithCourse>(
            r#"
            SELECT e.id, e.user_id, e.course_id, e.status, e.progress_percent,
                   e.enrolled_at, e.completed_at,
                   c.title AS course_title, c.category AS course_category
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(enrollments)
    }

    /// Scoped to the requesting user so missing rows and other users' rows
    /// are indistinguishable to the caller.
    pub async fn find_owned(
        pool: &PgPool,
        enrollment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            SELECT {ENROLLMENT_COLUMNS}
            FROM enrollments
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(enrollment_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(enrollment)
    }

    /// Applies a status change. The `status = 'active'` guard keeps the
    /// transition rule intact under concurrent updates: a row completed by a
    /// racing request cannot be moved again. Completion stamps
    /// `completed_at`; any other status clears it.
    pub async fn set_status(
        pool: &PgPool,
        enrollment_id: Uuid,
        user_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            UPDATE enrollments
            SET status = $3,
                completed_at = CASE
                    WHEN $3 = 'completed'::enrollment_status THEN NOW()
                    ELSE NULL
                END
            WHERE id = $1 AND user_id = $2 AND status = 'active'
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(enrollment_id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(enrollment)
    }
}
