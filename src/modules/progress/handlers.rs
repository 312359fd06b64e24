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
    EnrollmentRepository, ProgressRepository, ProgressWithContent, RecordProgress,
};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Records a completion (or in-progress) event for one lesson or module and
/// recomputes the enrollment's progress percentage.
pub async fn record_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecordProgress>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    payload.validate()?;

    let target = payload.target().ok_or_else(|| {
        AppError::Validation("Either lesson_id or module_id is required".to_string())
    })?;

    // Ownership check doubles as the existence check; both failures read as
    // the same 404.
    EnrollmentRepository::find_owned(&state.db, payload.enrollment_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    let (record, _percent) = ProgressRepository::record(&state.db, &payload, target).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": record.id }))))
}

/// Progress records for an owned enrollment, most recently completed first.
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(enrollment_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProgressWithContent>>> {
    EnrollmentRepository::find_owned(&state.db, enrollment_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    let records = ProgressRepository::list_for_enrollment(&state.db, enrollment_id).await?;
    Ok(Json(records))
}
