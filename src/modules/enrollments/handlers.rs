use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{
    CourseRepository, DatabaseError, Enrollment, EnrollmentRepository, EnrollmentWithCourse,
    NewEnrollment, UpdateEnrollmentStatus,
};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// All of the caller's enrollments with course metadata, newest first.
pub async fn list_enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<EnrollmentWithCourse>>> {
    let enrollments = EnrollmentRepository::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(enrollments))
}

pub async fn create_enrollment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewEnrollment>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let course = CourseRepository::find_by_id(&state.db, payload.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let enrollment = EnrollmentRepository::create(&state.db, auth.user_id, course.id)
        .await
        .map_err(|err| match err {
            DatabaseError::Duplicate => {
                AppError::Conflict("Already enrolled in this course".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": enrollment.id }))))
}

pub async fn update_enrollment_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(enrollment_id): Path<Uuid>,
    Json(payload): Json<UpdateEnrollmentStatus>,
) -> AppResult<Json<Enrollment>> {
    let enrollment = EnrollmentRepository::find_owned(&state.db, enrollment_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    if !enrollment.status.can_transition_to(payload.status) {
        return Err(AppError::InvalidState(
            "Enrollment status can no longer change".to_string(),
        ));
    }

    // The guarded UPDATE can still come back empty if a concurrent request
    // moved the row out of `active` first.
    let updated =
        EnrollmentRepository::set_status(&state.db, enrollment_id, auth.user_id, payload.status)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Enrollment status can no longer change".to_string())
            })?;

    Ok(Json(updated))
}
