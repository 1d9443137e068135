//! MySQL implementation of the UserRepository trait.
//!
//! The refresh slot lives in `refresh_token_hash`. Only the slot operations
//! write it; `save` leaves it untouched. Challenge and verification writes
//! are single-column updates so they never replay a stale snapshot. The compare-and-swap relies on a
//! single conditional `UPDATE` using MySQL's null-safe `<=>` operator, so the
//! check and the write happen atomically inside the row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use pa_core::domain::entities::user::User;
use pa_core::errors::DomainError;
use pa_core::repositories::UserRepository;

const USER_COLUMNS: &str = "id, name, phone_number, user_role, is_verified, otp_code, \
     otp_expires_at, refresh_token_hash, created_at, updated_at";

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserRepository {
    /// Create a new MySQL user repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| DomainError::storage(format!("Failed to get id: {}", e)))?;

        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| DomainError::storage(format!("Invalid UUID: {}", e)))?,
            name: Self::column(row, "name")?,
            phone_number: Self::column(row, "phone_number")?,
            user_role: Self::column(row, "user_role")?,
            is_verified: Self::column(row, "is_verified")?,
            otp_code: Self::column(row, "otp_code")?,
            otp_expires_at: Self::column::<Option<DateTime<Utc>>>(row, "otp_expires_at")?,
            active_refresh_token: Self::column(row, "refresh_token_hash")?,
            created_at: Self::column::<DateTime<Utc>>(row, "created_at")?,
            updated_at: Self::column::<DateTime<Utc>>(row, "updated_at")?,
        })
    }

    fn column<'r, T>(row: &'r sqlx::mysql::MySqlRow, name: &str) -> Result<T, DomainError>
    where
        T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
    {
        row.try_get(name)
            .map_err(|e| DomainError::storage(format!("Failed to get {}: {}", name, e)))
    }

    fn query_failed(e: sqlx::Error) -> DomainError {
        tracing::error!(error = %e, "User store query failed");
        DomainError::storage(format!("Database query failed: {}", e))
    }

    async fn fetch_one_by(&self, column: &str, value: String) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {} = ? LIMIT 1", USER_COLUMNS, column);

        let result = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        match result {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("phone_number", phone_number.to_string()).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("id", id.to_string()).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        if user.phone_number.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Phone number is required".to_string(),
            });
        }

        let query = r#"
            INSERT INTO users (
                id, name, phone_number, user_role, is_verified,
                otp_code, otp_expires_at, refresh_token_hash,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(&user.phone_number)
            .bind(&user.user_role)
            .bind(user.is_verified)
            .bind(&user.otp_code)
            .bind(user.otp_expires_at)
            .bind(&user.active_refresh_token)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Validation {
                    message: "Phone number already registered".to_string(),
                },
                _ => Self::query_failed(e),
            })?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), DomainError> {
        let query = r#"
            UPDATE users
            SET name = ?, phone_number = ?, user_role = ?, is_verified = ?,
                otp_code = ?, otp_expires_at = ?, updated_at = ?
            WHERE id = ?
        "#;

        let result = sqlx::query(query)
            .bind(&user.name)
            .bind(&user.phone_number)
            .bind(&user.user_role)
            .bind(user.is_verified)
            .bind(&user.otp_code)
            .bind(user.otp_expires_at)
            .bind(Utc::now())
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::storage(format!("User {} not found", user.id)));
        }

        Ok(())
    }

    async fn set_challenge(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let query = r#"
            UPDATE users
            SET otp_code = ?, otp_expires_at = ?, updated_at = ?
            WHERE id = ?
        "#;

        let result = sqlx::query(query)
            .bind(code)
            .bind(expires_at)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::storage(format!("User {} not found", id)));
        }

        Ok(())
    }

    async fn consume_challenge(&self, id: Uuid, code: &str) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE users
            SET otp_code = NULL, otp_expires_at = NULL, updated_at = ?
            WHERE id = ? AND otp_code = ?
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(id.to_string())
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::storage(format!("User {} not found", id)));
        }

        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, digest: Option<&str>) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET refresh_token_hash = ?, updated_at = ? WHERE id = ?")
            .bind(digest)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE users
            SET refresh_token_hash = ?, updated_at = ?
            WHERE id = ? AND refresh_token_hash <=> ?
        "#;

        let result = sqlx::query(query)
            .bind(new)
            .bind(Utc::now())
            .bind(id.to_string())
            .bind(expected)
            .execute(&self.pool)
            .await
            .map_err(Self::query_failed)?;

        let swapped = result.rows_affected() == 1;
        if !swapped {
            tracing::debug!(user_id = %id, "Refresh slot compare-and-swap lost");
        }
        Ok(swapped)
    }
}
