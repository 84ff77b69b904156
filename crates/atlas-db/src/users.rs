//! User repository.
//!
//! Used by the auth boundary (login, password reset), by unit ownership
//! and by the billing webhook handler.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use atlas_core::Id;

use crate::{RepositoryError, RepositoryResult};

/// User row from database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub is_subscribed: bool,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = "id, email, name, password_hash, role, reset_token, \
     reset_token_expires_at, is_subscribed, stripe_subscription_id, created_at, updated_at";

/// DTO for creating a user
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
}

/// DTO for updating a user profile
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// User repository
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, dto: CreateUserDto) -> RepositoryResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(&dto.email)
        .bind(&dto.name)
        .bind(&dto.password_hash)
        .bind(&dto.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("email already registered: {}", dto.email))
            }
            _ => err.into(),
        })?;
        Ok(row)
    }

    pub async fn update_profile(&self, id: Id, dto: UpdateUserDto) -> RepositoryResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&dto.email)
        .bind(&dto.name)
        .bind(&dto.password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("user {}", id)))?;
        Ok(row)
    }

    /// Store a password-reset token with its expiry.
    pub async fn set_reset_token(
        &self,
        id: Id,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Resolve a reset token that has not expired.
    pub async fn find_by_valid_reset_token(&self, token: &str) -> RepositoryResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM users \
             WHERE reset_token = $1 AND reset_token_expires_at > NOW()"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn clear_reset_token(&self, id: Id) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token = NULL, reset_token_expires_at = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Flip the subscription state, recording the processor's id.
    pub async fn set_subscription(
        &self,
        id: Id,
        subscribed: bool,
        subscription_id: Option<&str>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_subscribed = $2, stripe_subscription_id = $3, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(subscribed)
        .bind(subscription_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}
