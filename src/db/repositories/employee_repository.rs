use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{Employee, EmployeeStats, NewEmployee, UpdateEmployee};

const EMPLOYEE_COLUMNS: &str = "id, guardian_id, email, name, phone, status, password_hash, invite_token, token_expires_at, created_at, updated_at";

/// Result of a seat-quota-checked insert.
pub enum CreateEmployeeOutcome {
    Created(Employee),
    QuotaExceeded { limit: i32 },
}

pub struct EmployeeRepository;

impl EmployeeRepository {
    pub async fn list_for_guardian(
        pool: &PgPool,
        guardian_id: Uuid,
    ) -> Result<Vec<Employee>, DatabaseError> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees
            WHERE guardian_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(guardian_id)
        .fetch_all(pool)
        .await?;

        Ok(employees)
    }

    pub async fn stats_for_guardian(
        pool: &PgPool,
        guardian_id: Uuid,
    ) -> Result<EmployeeStats, DatabaseError> {
        let limit: Option<i32> = sqlx::query_scalar("SELECT employee_limit FROM users WHERE id = $1")
            .bind(guardian_id)
            .fetch_optional(pool)
            .await?;
        let limit = limit.ok_or(DatabaseError::NotFound)?;

        let (total, active, pending): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'active'),
                   COUNT(*) FILTER (WHERE status = 'pending')
            FROM employees
            WHERE guardian_id = $1
            "#,
        )
        .bind(guardian_id)
        .fetch_one(pool)
        .await?;

        Ok(EmployeeStats::new(total, active, pending, limit as i64))
    }

    /// Count-then-insert runs in one transaction that locks the guardian's
    /// row first, so concurrent adds for the same guardian serialize and the
    /// seat limit cannot be transiently exceeded.
    pub async fn create(
        pool: &PgPool,
        guardian_id: Uuid,
        new_employee: &NewEmployee,
        invite_token: &str,
        token_expires_at: OffsetDateTime,
    ) -> Result<CreateEmployeeOutcome, DatabaseError> {
        let mut tx = pool.begin().await?;

        let limit: Option<i32> =
            sqlx::query_scalar("SELECT employee_limit FROM users WHERE id = $1 FOR UPDATE")
                .bind(guardian_id)
                .fetch_optional(&mut *tx)
                .await?;
        let limit = limit.ok_or(DatabaseError::NotFound)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE guardian_id = $1")
            .bind(guardian_id)
            .fetch_one(&mut *tx)
            .await?;

        if count >= limit as i64 {
            // Dropping the transaction rolls the lock back.
            return Ok(CreateEmployeeOutcome::QuotaExceeded { limit });
        }

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (guardian_id, email, name, phone, invite_token, token_expires_at)
            VALUES ($1, LOWER($2), $3, $4, $5, $6)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(guardian_id)
        .bind(&new_employee.email)
        .bind(&new_employee.name)
        .bind(&new_employee.phone)
        .bind(invite_token)
        .bind(token_expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CreateEmployeeOutcome::Created(employee))
    }

    /// Activates the pending employee holding this exact, unexpired token
    /// and clears the token in the same statement. Unknown and expired
    /// tokens both come back as `None`.
    pub async fn activate_by_token(
        pool: &PgPool,
        invite_token: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<Option<Employee>, DatabaseError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET status = 'active',
                invite_token = NULL,
                token_expires_at = NULL,
                password_hash = $2,
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE invite_token = $1
              AND token_expires_at > NOW()
              AND status = 'pending'
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(invite_token)
        .bind(password_hash)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }

    pub async fn update(
        pool: &PgPool,
        employee_id: Uuid,
        guardian_id: Uuid,
        update: &UpdateEmployee,
    ) -> Result<Option<Employee>, DatabaseError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET email = COALESCE(LOWER($3), email),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                updated_at = NOW()
            WHERE id = $1 AND guardian_id = $2
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(guardian_id)
        .bind(&update.email)
        .bind(&update.name)
        .bind(&update.phone)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }

    pub async fn delete(
        pool: &PgPool,
        employee_id: Uuid,
        guardian_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND guardian_id = $2")
            .bind(employee_id)
            .bind(guardian_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::db::models::{generate_invite_token, EmployeeStatus};

    async fn seed_guardian(pool: &PgPool, employee_limit: i32) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (email, name, role, employee_limit)
            VALUES ('guardian@example.com', 'Guardian', 'guardian', $1)
            RETURNING id
            "#,
        )
        .bind(employee_limit)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn new_employee(email: &str) -> NewEmployee {
        NewEmployee {
            email: email.to_string(),
            name: "Employee".to_string(),
            phone: None,
        }
    }

    #[sqlx::test]
    async fn expired_tokens_activate_nothing_just_like_unknown_ones(pool: PgPool) {
        let guardian_id = seed_guardian(&pool, 5).await;
        let token = generate_invite_token();

        // A pending employee whose invite lapsed yesterday.
        sqlx::query(
            r#"
            INSERT INTO employees (guardian_id, email, name, invite_token, token_expires_at)
            VALUES ($1, 'emp@example.com', 'Employee', $2, NOW() - INTERVAL '1 day')
            "#,
        )
        .bind(guardian_id)
        .bind(&token)
        .execute(&pool)
        .await
        .unwrap();

        let expired = EmployeeRepository::activate_by_token(&pool, &token, "$argon2id$stub", None)
            .await
            .unwrap();
        let unknown =
            EmployeeRepository::activate_by_token(&pool, "no-such-token", "$argon2id$stub", None)
                .await
                .unwrap();
        assert!(expired.is_none());
        assert!(unknown.is_none());

        // The lapsed row is left exactly as it was.
        let employees = EmployeeRepository::list_for_guardian(&pool, guardian_id)
            .await
            .unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].status, EmployeeStatus::Pending);
        assert_eq!(employees[0].invite_token.as_deref(), Some(token.as_str()));
        assert!(employees[0].password_hash.is_none());
    }

    #[sqlx::test]
    async fn quota_blocks_the_seat_after_the_limit(pool: PgPool) {
        let guardian_id = seed_guardian(&pool, 2).await;
        let expiry = OffsetDateTime::now_utc() + Duration::days(7);

        for email in ["a@example.com", "b@example.com"] {
            let outcome = EmployeeRepository::create(
                &pool,
                guardian_id,
                &new_employee(email),
                &generate_invite_token(),
                expiry,
            )
            .await
            .unwrap();
            assert!(matches!(outcome, CreateEmployeeOutcome::Created(_)));
        }

        let third = EmployeeRepository::create(
            &pool,
            guardian_id,
            &new_employee("c@example.com"),
            &generate_invite_token(),
            expiry,
        )
        .await
        .unwrap();
        assert!(matches!(
            third,
            CreateEmployeeOutcome::QuotaExceeded { limit: 2 }
        ));

        let stats = EmployeeRepository::stats_for_guardian(&pool, guardian_id)
            .await
            .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.available, 0);
    }
}
