//! Persistence layer.
//!
//! Services talk to user storage through [`CredentialStore`] so the session
//! logic does not depend on the SQLite implementation in
//! [`user_repository`].

pub mod user_repository;

use crate::database::models::{CreateUser, User, UserChanges, UserView};
use crate::errors::ServiceResult;
use anyhow::Result;
use async_trait::async_trait;

/// Storage contract for user records and their single session slot.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds the user whose username equals `username` or whose email
    /// equals `email`. Either may be omitted.
    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Like [`find_by_id`](Self::find_by_id) but only reads client-safe columns.
    async fn find_view_by_id(&self, id: &str) -> Result<Option<UserView>>;

    /// Inserts a user. Fails with `ServiceError::AlreadyExists` when the
    /// username or email is taken.
    async fn create(&self, user: CreateUser) -> ServiceResult<User>;

    /// Applies a partial profile update and returns the updated row.
    async fn update_fields(&self, id: &str, changes: UserChanges) -> ServiceResult<User>;

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool>;

    /// Overwrites the session slot unconditionally; `None` logs the user out.
    async fn set_refresh_token(&self, id: &str, token_hash: Option<&str>) -> Result<bool>;

    /// Replaces the session slot only if it still holds `expected_hash`.
    /// Returns `false` when another writer got there first.
    async fn swap_refresh_token(&self, id: &str, expected_hash: &str, new_hash: &str)
    -> Result<bool>;

    async fn delete(&self, id: &str) -> Result<bool>;
}
