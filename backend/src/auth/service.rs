//! Core business logic for the session lifecycle.
//!
//! A user is either logged out (no stored refresh token) or has exactly one
//! active session: the digest of the refresh token issued by the latest
//! login or refresh. Every refresh rotates that slot, so a refresh token
//! works once.

use crate::auth::models::*;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::CredentialStore;
use crate::utils::crypto::{digest_token, hash_password, verify_password};
use crate::utils::jwt::{TokenKind, TokenPair, TokenService};
use tracing::{debug, info, warn};
use validator::Validate;

const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";
const USED_REFRESH_TOKEN: &str = "Refresh token is expired or used";

/// Orchestrates login, logout, refresh and password change.
pub struct SessionManager<'a, S: CredentialStore + ?Sized> {
    store: &'a S,
    tokens: &'a TokenService,
    bcrypt_cost: u32,
}

impl<'a, S: CredentialStore + ?Sized> SessionManager<'a, S> {
    /// Create a new SessionManager instance
    pub fn new(store: &'a S, tokens: &'a TokenService, bcrypt_cost: u32) -> Self {
        SessionManager {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Authenticate by username or email and open a fresh session.
    ///
    /// Any session the user already had is replaced.
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<LoginResponse> {
        login_request.validate()?;

        let (username, email) = login_request.identity();
        if username.is_none() && email.is_none() {
            return Err(ServiceError::validation("username or email is required"));
        }

        let user = self
            .store
            .find_by_identity(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(
                    "User",
                    username.as_deref().or(email.as_deref()).unwrap_or_default(),
                )
            })?;

        let password_valid =
            verify_password(login_request.password, user.password_hash.clone()).await?;
        if !password_valid {
            warn!("Rejected login for user {}", user.id);
            return Err(ServiceError::unauthorized("Invalid user credentials"));
        }

        let pair = self.tokens.issue_pair(&user.id)?;
        self.store
            .set_refresh_token(&user.id, Some(&digest_token(&pair.refresh_token)))
            .await?;

        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            user: user.sanitized(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Close the caller's session by clearing the stored refresh token.
    pub async fn logout(&self, context: &AuthContext) -> ServiceResult<()> {
        let cleared = self.store.set_refresh_token(&context.user_id, None).await?;
        if !cleared {
            debug!("Logout for unknown user {}", context.user_id);
        }
        info!("User {} logged out", context.user_id);
        Ok(())
    }

    /// Exchange a refresh token for a new pair, invalidating the one presented.
    ///
    /// # Errors
    /// Returns `ServiceError::Unauthorized` when the token is missing, fails
    /// verification, belongs to no user, or is not the one currently stored.
    pub async fn refresh(&self, presented: Option<&str>) -> ServiceResult<TokenPair> {
        let presented = presented
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::unauthorized("Unauthorized request"))?;

        let claims = self
            .tokens
            .verify(presented, TokenKind::Refresh)
            .map_err(|e| {
                debug!("Refresh token verification failed: {}", e);
                ServiceError::unauthorized(INVALID_REFRESH_TOKEN)
            })?;

        let user = self
            .store
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_REFRESH_TOKEN))?;

        if !user.is_logged_in() {
            warn!("Refresh token presented for logged-out user {}", user.id);
            return Err(ServiceError::unauthorized(USED_REFRESH_TOKEN));
        }

        let presented_hash = digest_token(presented);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            warn!("Stale or reused refresh token for user {}", user.id);
            return Err(ServiceError::unauthorized(USED_REFRESH_TOKEN));
        }

        let pair = self.tokens.issue_pair(&user.id)?;
        let rotated = self
            .store
            .swap_refresh_token(&user.id, &presented_hash, &digest_token(&pair.refresh_token))
            .await?;
        if !rotated {
            // A concurrent refresh or logout replaced the slot after we read it.
            warn!("Refresh token for user {} rotated concurrently", user.id);
            return Err(ServiceError::unauthorized(USED_REFRESH_TOKEN));
        }

        debug!(
            "Rotated refresh token for user {} (previous issued at {:?})",
            user.id, user.refresh_token_issued_at
        );
        Ok(pair)
    }

    /// Replace the caller's password after checking the old one.
    ///
    /// Existing sessions stay valid.
    pub async fn change_password(
        &self,
        context: &AuthContext,
        request: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        request.validate()?;

        let user = self
            .store
            .find_by_id(&context.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", &context.user_id))?;

        if !verify_password(request.old_password, user.password_hash).await? {
            return Err(ServiceError::unauthorized("Invalid old password"));
        }

        let password_hash = hash_password(request.new_password, self.bcrypt_cost).await?;
        if !self.store.update_password(&user.id, &password_hash).await? {
            return Err(ServiceError::not_found("User", &user.id));
        }

        info!("User {} changed password", user.id);
        Ok(())
    }
}
