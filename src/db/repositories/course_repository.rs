use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::Course;

/// Read side of the curriculum tree. Authoring lives elsewhere.
pub struct CourseRepository;

impl CourseRepository {
    pub async fn find_by_id(pool: &PgPool, course_id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, category, is_published, created_at, updated_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

        Ok(course)
    }
}
