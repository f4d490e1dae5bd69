//! Middleware for protecting authenticated routes.
//!
//! Validates the access token carried in the `accessToken` cookie or an
//! `Authorization: Bearer` header and attaches the caller's identity to the
//! request as an [`AuthContext`].

use crate::api::common::ApiError;
use crate::auth::models::AuthContext;
use crate::errors::ServiceError;
use crate::repositories::CredentialStore;
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::cookies::{ACCESS_TOKEN_COOKIE, extract_bearer_token, read_cookie};
use crate::utils::jwt::TokenKind;
use axum::{Extension, extract::Request, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// JWT authentication middleware
pub async fn jwt_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_cookie(request.headers(), ACCESS_TOKEN_COOKIE)
        .or_else(|| extract_bearer_token(request.headers()))
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = state
        .tokens
        .verify(&token, TokenKind::Access)
        .map_err(|e| {
            debug!("Access token rejected: {}", e);
            ApiError::unauthorized("Invalid or expired access token")
        })?;

    // The token may outlive the account it was issued for.
    let repo = UserRepository::new(&state.pool);
    let user = repo
        .find_view_by_id(claims.user_id())
        .await
        .map_err(|e| ApiError::from(ServiceError::from(e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

    request.extensions_mut().insert(AuthContext { user_id: user.id });
    Ok(next.run(request).await)
}
