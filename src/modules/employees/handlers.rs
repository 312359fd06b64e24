use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{
    generate_invite_token, invite_token_expiry, CreateEmployeeOutcome, DatabaseError, Employee,
    EmployeeRepository, EmployeeStats, NewEmployee, UpdateEmployee, VerifyInvite,
};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Serialize)]
pub struct EmployeeListing {
    pub employees: Vec<Employee>,
    pub stats: EmployeeStats,
}

pub async fn list_employees(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<EmployeeListing>> {
    auth.require_guardian()?;

    let employees = EmployeeRepository::list_for_guardian(&state.db, auth.user_id).await?;
    let stats = EmployeeRepository::stats_for_guardian(&state.db, auth.user_id).await?;

    Ok(Json(EmployeeListing { employees, stats }))
}

/// Provisions a pending employee under the guardian's seat quota and returns
/// the invite link to hand to them.
pub async fn add_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewEmployee>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    auth.require_guardian()?;
    payload.validate()?;

    let invite_token = generate_invite_token();
    let token_expires_at = invite_token_expiry(time::OffsetDateTime::now_utc());

    let outcome = EmployeeRepository::create(
        &state.db,
        auth.user_id,
        &payload,
        &invite_token,
        token_expires_at,
    )
    .await
    .map_err(|err| match err {
        DatabaseError::Duplicate => {
            AppError::Conflict("An employee with this email already exists".to_string())
        }
        other => AppError::Database(other),
    })?;

    let employee = match outcome {
        CreateEmployeeOutcome::Created(employee) => employee,
        CreateEmployeeOutcome::QuotaExceeded { limit } => {
            return Err(AppError::QuotaExceeded(format!(
                "Employee limit reached ({} seats)",
                limit
            )));
        }
    };

    let invite_link = format!(
        "{}/employees/verify-invite/{}",
        state.env.app.base_url, invite_token
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": employee.id, "invite_link": invite_link })),
    ))
}

/// Public activation endpoint. Unknown and expired tokens are deliberately
/// indistinguishable. Activation does not yet create a login identity for
/// the employee; that hand-off belongs to the external identity
/// collaborator.
pub async fn verify_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<VerifyInvite>,
) -> AppResult<Json<Employee>> {
    let password = payload.password.expose_secret();
    if !password_meets_minimum(password) {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;

    let employee = EmployeeRepository::activate_by_token(
        &state.db,
        &token,
        &password_hash,
        payload.name.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Invalid or expired invitation".to_string()))?;

    Ok(Json(employee))
}

pub async fn update_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<UpdateEmployee>,
) -> AppResult<Json<Employee>> {
    auth.require_guardian()?;
    payload.validate()?;

    let employee = EmployeeRepository::update(&state.db, employee_id, auth.user_id, &payload)
        .await
        .map_err(|err| match err {
            DatabaseError::Duplicate => {
                AppError::Conflict("An employee with this email already exists".to_string())
            }
            other => AppError::Database(other),
        })?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    auth.require_guardian()?;

    let deleted = EmployeeRepository::delete(&state.db, employee_id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Employee not found".to_string()));
    }

    Ok(Json(json!({ "message": "Employee deleted" })))
}

// Counted in characters, not bytes, so multibyte passwords are not
// over-credited for their encoding length.
fn password_meets_minimum(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| AppError::Internal(format!("Salt generation failed: {}", err)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("Password hashing failed: {}", err)))
}
