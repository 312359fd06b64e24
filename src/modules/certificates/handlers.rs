use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{
    Certificate, CertificateRepository, CertificateWithCourse, DatabaseError,
    EnrollmentRepository, EnrollmentStatus, NewCertificate,
};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct IssuedCertificate {
    pub id: Uuid,
    pub certificate_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct VerifiedCertificate {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub is_valid: bool,
}

pub async fn list_certificates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<CertificateWithCourse>>> {
    let certificates = CertificateRepository::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(certificates))
}

/// Converts a completed enrollment into a credential. One certificate per
/// enrollment, ever.
pub async fn issue_certificate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewCertificate>,
) -> AppResult<(StatusCode, Json<IssuedCertificate>)> {
    let enrollment = EnrollmentRepository::find_owned(&state.db, payload.enrollment_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    if enrollment.status != EnrollmentStatus::Completed {
        return Err(AppError::InvalidState(
            "Course must be completed before a certificate can be issued".to_string(),
        ));
    }

    if CertificateRepository::find_for_enrollment(&state.db, enrollment.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Certificate already issued for this enrollment".to_string(),
        ));
    }

    let certificate = CertificateRepository::issue(&state.db, &enrollment)
        .await
        .map_err(|err| match err {
            // Backstop for two racing issue calls: the per-enrollment
            // constraint fires on the loser.
            DatabaseError::Duplicate => {
                AppError::Conflict("Certificate already issued for this enrollment".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(IssuedCertificate {
            id: certificate.id,
            certificate_number: certificate.certificate_number,
            issued_at: certificate.issued_at,
            expires_at: certificate.expires_at,
        }),
    ))
}

/// Public verification endpoint. Expiry never hides the record; validity is
/// computed at read time.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_number): Path<String>,
) -> AppResult<Json<VerifiedCertificate>> {
    let certificate = CertificateRepository::find_by_number(&state.db, &certificate_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))?;

    let is_valid = certificate.is_valid_at(OffsetDateTime::now_utc());

    Ok(Json(VerifiedCertificate {
        certificate,
        is_valid,
    }))
}
