use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::db::UserRole;
use crate::error::AppError;

/// Verified identity forwarded by the auth gateway after bearer validation.
/// Token issuance and validation live outside this service; the core only
/// consumes the resulting `{user_id, role}` pair.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    /// Guardian-only surfaces reject every other role with 403.
    pub fn require_guardian(&self) -> Result<(), AppError> {
        if self.role == UserRole::Guardian {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Company guardian role required".to_string(),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Uuid>().ok())
            .ok_or_else(|| AppError::Authentication("Missing or invalid identity".to_string()))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<UserRole>().ok())
            .ok_or_else(|| AppError::Authentication("Missing or invalid role".to_string()))?;

        Ok(AuthUser { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn guardian_gate_rejects_learners() {
        let learner = AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Learner,
        };
        let err = learner.require_guardian().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let guardian = AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Guardian,
        };
        assert!(guardian.require_guardian().is_ok());
    }
}
