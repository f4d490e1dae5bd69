//! Database repository for user management operations.
//!
//! Provides CRUD operations for users and the compare-and-set update that
//! rotates the stored refresh token.

use crate::{
    database::models::{CreateUser, User, UserChanges, UserView},
    errors::{ServiceError, ServiceResult},
    repositories::CredentialStore,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_image_url, \
     password_hash, refresh_token_hash, refresh_token_issued_at, created_at, updated_at";

const USER_VIEW_COLUMNS: &str =
    "id, username, email, full_name, avatar_url, cover_image_url, created_at, updated_at";

/// Repository for user database operations.
///
/// Handles all persistence operations for the User entity. Uniqueness of
/// username and email is enforced by the schema and reported as
/// `ServiceError::AlreadyExists`.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }
}

/// Turns a unique-constraint violation into a conflict, anything else into a
/// database error.
fn map_write_error(error: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return ServiceError::already_exists("user with email or username already exists");
        }
    }
    ServiceError::from(anyhow::Error::from(error))
}

#[async_trait]
impl CredentialStore for UserRepository<'_> {
    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    async fn find_view_by_id(&self, id: &str) -> Result<Option<UserView>> {
        let user = sqlx::query_as::<_, UserView>(&format!(
            "SELECT {USER_VIEW_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> ServiceResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar_url, cover_image_url,
                               password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user)
    }

    async fn update_fields(&self, id: &str, changes: UserChanges) -> ServiceResult<User> {
        if changes.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::not_found("User", id));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE(?, full_name),
                email = COALESCE(?, email),
                avatar_url = COALESCE(?, avatar_url),
                cover_image_url = COALESCE(?, cover_image_url),
                updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(changes.full_name)
        .bind(changes.email)
        .bind(changes.avatar_url)
        .bind(changes.cover_image_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?;

        user.ok_or_else(|| ServiceError::not_found("User", id))
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_refresh_token(&self, id: &str, token_hash: Option<&str>) -> Result<bool> {
        let issued_at = token_hash.map(|_| Utc::now());
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = ?, refresh_token_issued_at = ? WHERE id = ?",
        )
        .bind(token_hash)
        .bind(issued_at)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn swap_refresh_token(
        &self,
        id: &str,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET refresh_token_hash = ?, refresh_token_issued_at = ?
            WHERE id = ? AND refresh_token_hash = ?
            "#,
        )
        .bind(new_hash)
        .bind(Utc::now())
        .bind(id)
        .bind(expected_hash)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
