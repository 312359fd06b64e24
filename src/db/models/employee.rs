use rand::RngCore;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Duration, OffsetDateTime};
use validator::Validate;

/// Invite tokens are single-use and expire a week after creation.
pub const INVITE_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "employee_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub guardian_id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub status: EmployeeStatus,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub invite_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub token_expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Seat usage reported alongside the employee listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmployeeStats {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub limit: i64,
    pub available: i64,
}

impl EmployeeStats {
    /// `available` is clamped at zero: quotas can be lowered below the
    /// current head count and the listing must not report a negative seat
    /// count when that happens.
    pub fn new(total: i64, active: i64, pending: i64, limit: i64) -> Self {
        EmployeeStats {
            total,
            active,
            pending,
            limit,
            available: (limit - total).max(0),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewEmployee {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployee {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyInvite {
    pub password: SecretBox<String>,
    pub name: Option<String>,
}

/// 32 random bytes, hex-encoded.
pub fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn invite_token_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + Duration::days(INVITE_TOKEN_TTL_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_available_counts_down_to_zero() {
        assert_eq!(EmployeeStats::new(0, 0, 0, 2).available, 2);
        assert_eq!(EmployeeStats::new(1, 0, 1, 2).available, 1);
        assert_eq!(EmployeeStats::new(2, 1, 1, 2).available, 0);
    }

    #[test]
    fn stats_available_is_clamped_non_negative() {
        // Limit lowered below the existing head count.
        assert_eq!(EmployeeStats::new(5, 5, 0, 2).available, 0);
    }

    #[test]
    fn invite_tokens_are_64_hex_chars_and_distinct() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn invite_expiry_is_seven_days_out() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(invite_token_expiry(now) - now, Duration::days(7));
    }
}
