use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Duration, OffsetDateTime};
use validator::Validate;

/// How long an issued certificate stays valid.
const VALIDITY_YEARS: i32 = 3;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub certificate_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Certificate {
    /// Validity is computed at read time, never stored.
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now <= self.expires_at
    }
}

/// Certificate joined with course metadata for listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CertificateWithCourse {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub certificate_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub course_title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCertificate {
    pub enrollment_id: Uuid,
}

/// `CERT-<year>-<4-digit-random>`. The 10k namespace per year collides
/// quickly; uniqueness is owned by the storage constraint and issuance
/// retries generation on a collision.
pub fn generate_certificate_number(issued_at: OffsetDateTime) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("CERT-{}-{:04}", issued_at.year(), suffix)
}

/// Issued-at plus three calendar years; Feb 29 falls back to the day before.
pub fn expiry_from(issued_at: OffsetDateTime) -> OffsetDateTime {
    let target_year = issued_at.year() + VALIDITY_YEARS;
    issued_at
        .replace_year(target_year)
        .or_else(|_| (issued_at - Duration::days(1)).replace_year(target_year))
        .unwrap_or(issued_at + Duration::days(365 * VALIDITY_YEARS as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn number_has_cert_year_and_four_digits() {
        let issued = datetime!(2026-03-15 12:00 UTC);
        for _ in 0..50 {
            let number = generate_certificate_number(issued);
            let parts: Vec<&str> = number.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], "CERT");
            assert_eq!(parts[1], "2026");
            assert_eq!(parts[2].len(), 4);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn expiry_is_three_calendar_years_out() {
        let issued = datetime!(2026-03-15 12:00 UTC);
        assert_eq!(expiry_from(issued), datetime!(2029-03-15 12:00 UTC));
    }

    #[test]
    fn leap_day_issuance_still_produces_an_expiry() {
        let issued = datetime!(2024-02-29 12:00 UTC);
        assert_eq!(expiry_from(issued), datetime!(2027-02-28 12:00 UTC));
    }

    #[test]
    fn validity_flips_exactly_at_expiry() {
        let cert = Certificate {
            id: Uuid::new_v4(),
            enrollment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            certificate_number: "CERT-2026-0042".to_string(),
            issued_at: datetime!(2026-01-01 00:00 UTC),
            expires_at: datetime!(2029-01-01 00:00 UTC),
        };
        assert!(cert.is_valid_at(datetime!(2029-01-01 00:00 UTC)));
        assert!(!cert.is_valid_at(datetime!(2029-01-01 00:00:01 UTC)));
    }
}
