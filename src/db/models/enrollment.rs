use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    /// Status changes are only permitted while the enrollment is active;
    /// `completed` and `dropped` are terminal.
    pub fn can_transition_to(self, _next: EnrollmentStatus) -> bool {
        self == EnrollmentStatus::Active
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub progress_percent: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

/// Enrollment joined with course metadata for listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EnrollmentWithCourse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub progress_percent: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub course_title: String,
    pub course_category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewEnrollment {
    pub course_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEnrollmentStatus {
    pub status: EnrollmentStatus,
}
