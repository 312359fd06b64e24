use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{
    expiry_from, generate_certificate_number, Certificate, CertificateWithCourse, Enrollment,
};

const CERTIFICATE_COLUMNS: &str =
    "id, enrollment_id, user_id, course_id, certificate_number, issued_at, expires_at";

/// The 4-digit suffix namespace is small, so number collisions within a year
/// are expected; generation is retried this many times before giving up.
const MAX_NUMBER_ATTEMPTS: u32 = 5;

pub struct CertificateRepository;

impl CertificateRepository {
    /// Inserts the certificate, regenerating the number on a
    /// `certificate_number` collision. A violation of the per-enrollment
    /// uniqueness is not retried: that is the caller's `Conflict`.
    pub async fn issue(pool: &PgPool, enrollment: &Enrollment) -> Result<Certificate, DatabaseError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let issued_at = OffsetDateTime::now_utc();
            let number = generate_certificate_number(issued_at);
            let expires_at = expiry_from(issued_at);

            let result = sqlx::query_as::<_, Certificate>(&format!(
                r#"
                INSERT INTO certificates
                    (enrollment_id, user_id, course_id, certificate_number, issued_at, expires_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {CERTIFICATE_COLUMNS}
                "#
            ))
            .bind(enrollment.id)
            .bind(enrollment.user_id)
            .bind(enrollment.course_id)
            .bind(&number)
            .bind(issued_at)
            .bind(expires_at)
            .fetch_one(pool)
            .await;

            match result {
                Ok(certificate) => return Ok(certificate),
                Err(err) if is_number_collision(&err) => {
                    if attempt < MAX_NUMBER_ATTEMPTS {
                        tracing::warn!(attempt, %number, "certificate number collision, retrying");
                        continue;
                    }
                    // Number namespace exhausted. No certificate exists for
                    // this enrollment, so this must not read as a duplicate.
                    tracing::error!(attempt, %number, "certificate number namespace exhausted");
                    return Err(DatabaseError::Sqlx(err));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub async fn find_for_enrollment(
        pool: &PgPool,
        enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let certificate = sqlx::query_as::<_, Certificate>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE enrollment_id = $1
            "#
        ))
        .bind(enrollment_id)
        .fetch_optional(pool)
        .await?;

        Ok(certificate)
    }

    pub async fn find_by_number(
        pool: &PgPool,
        certificate_number: &str,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let certificate = sqlx::query_as::<_, Certificate>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE certificate_number = $1
            "#
        ))
        .bind(certificate_number)
        .fetch_optional(pool)
        .await?;

        Ok(certificate)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<CertificateWithCourse>, DatabaseError> {
        let certificates = sqlx::query_as::<_, CertificateWithCourse>(
            r#"
            SELECT ct.id, ct.enrollment_id, ct.course_id, ct.certificate_number,
                   ct.issued_at, ct.expires_at,
                   c.title AS course_title
            FROM certificates ct
            JOIN courses c ON c.id = ct.course_id
            WHERE ct.user_id = $1
            ORDER BY ct.issued_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(certificates)
    }
}

fn is_number_collision(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| {
            db_err.is_unique_violation()
                && db_err.constraint() == Some("certificates_certificate_number_key")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::fmt;

    use super::*;
    use crate::error::AppError;

    #[derive(Debug)]
    struct UniqueViolation {
        constraint: &'static str,
    }

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "duplicate key value violates unique constraint \"{}\"",
                self.constraint
            )
        }
    }

    impl StdError for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    fn unique_violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
    }

    #[test]
    fn number_collisions_are_told_apart_from_enrollment_conflicts() {
        assert!(is_number_collision(&unique_violation(
            "certificates_certificate_number_key"
        )));
        assert!(!is_number_collision(&unique_violation(
            "certificates_enrollment_id_key"
        )));
    }

    #[test]
    fn exhausted_number_retries_surface_as_storage_failure_not_conflict() {
        // The per-enrollment violation is the only one that may read as a
        // duplicate to the handler.
        let enrollment_conflict =
            AppError::Database(unique_violation("certificates_enrollment_id_key").into());
        assert_eq!(
            enrollment_conflict.status_code(),
            axum::http::StatusCode::CONFLICT
        );

        // Giving up on the number namespace keeps the raw error, so the
        // caller sees a 500 rather than a fictitious already-issued 409.
        let namespace_exhausted = AppError::Database(DatabaseError::Sqlx(unique_violation(
            "certificates_certificate_number_key",
        )));
        assert_eq!(
            namespace_exhausted.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    const CERTIFICATE_ENROLLMENT_COLUMNS: &str =
        "id, user_id, course_id, status, progress_percent, enrolled_at, completed_at";

    async fn completed_enrollment(pool: &PgPool) -> Enrollment {
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, name) VALUES ('learner@example.com', 'Learner') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let course_id: Uuid =
            sqlx::query_scalar("INSERT INTO courses (title) VALUES ('Forklift Safety') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();
        sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            INSERT INTO enrollments (user_id, course_id, status, progress_percent, completed_at)
            VALUES ($1, $2, 'completed', 100, NOW())
            RETURNING {CERTIFICATE_ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn second_issue_for_an_enrollment_conflicts_and_keeps_the_first(pool: PgPool) {
        let enrollment = completed_enrollment(&pool).await;

        let first = CertificateRepository::issue(&pool, &enrollment).await.unwrap();

        let second = CertificateRepository::issue(&pool, &enrollment).await;
        assert!(matches!(second, Err(DatabaseError::Duplicate)));

        // The original certificate still verifies by number.
        let found = CertificateRepository::find_by_number(&pool, &first.certificate_number)
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(first.id));
    }
}
