//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for login, logout, token
//! refresh and password change, delegate to the [`SessionManager`], and set
//! or clear the session cookies.

use crate::api::common::{ApiError, ApiResponse};
use crate::auth::models::*;
use crate::auth::service::SessionManager;
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::cookies::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, cleared_cookie, read_cookie, token_cookie,
};
use crate::utils::jwt::{TokenKind, TokenPair, TokenService};
use axum::{
    body::Bytes,
    extract::{Extension, Json, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

/// Build the `Set-Cookie` headers carrying a fresh token pair.
fn session_cookies(
    tokens: &TokenService,
    pair: &TokenPair,
    secure: bool,
) -> Result<HeaderMap, ApiError> {
    let access = token_cookie(
        ACCESS_TOKEN_COOKIE,
        &pair.access_token,
        tokens.expires_in(TokenKind::Access),
        secure,
    );
    let refresh = token_cookie(
        REFRESH_TOKEN_COOKIE,
        &pair.refresh_token,
        tokens.expires_in(TokenKind::Refresh),
        secure,
    );

    match (access, refresh) {
        (Ok(access), Ok(refresh)) => {
            let mut headers = HeaderMap::new();
            headers.append(SET_COOKIE, access);
            headers.append(SET_COOKIE, refresh);
            Ok(headers)
        }
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to build session cookie: {}", e);
            Err(ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to build session cookie",
            ))
        }
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let repo = UserRepository::new(&state.pool);
    let sessions = SessionManager::new(&repo, &state.tokens, state.auth.bcrypt_cost);

    let response = sessions.login(payload).await?;
    let cookies = session_cookies(
        &state.tokens,
        &TokenPair {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
        },
        state.auth.cookie_secure,
    )?;

    Ok((
        cookies,
        ApiResponse::ok(response, "User logged in successfully"),
    ))
}

/// Handle logout request: clear the stored session and both cookies
#[axum::debug_handler]
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = UserRepository::new(&state.pool);
    let sessions = SessionManager::new(&repo, &state.tokens, state.auth.bcrypt_cost);
    sessions.logout(&context).await?;

    // Always clear the cookies, even if the session slot was already empty.
    let mut headers = HeaderMap::new();
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        if let Ok(cookie) = cleared_cookie(name, state.auth.cookie_secure) {
            headers.append(SET_COOKIE, cookie);
        }
    }

    Ok((
        headers,
        ApiResponse::ok(serde_json::json!({}), "User logged out"),
    ))
}

/// Handle token refresh request; the cookie wins over the body
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let presented = read_cookie(&headers, REFRESH_TOKEN_COOKIE).or_else(|| {
        serde_json::from_slice::<RefreshTokenRequest>(&body)
            .ok()
            .and_then(|request| request.refresh_token)
    });

    let repo = UserRepository::new(&state.pool);
    let sessions = SessionManager::new(&repo, &state.tokens, state.auth.bcrypt_cost);
    let pair = sessions.refresh(presented.as_deref()).await?;
    let cookies = session_cookies(&state.tokens, &pair, state.auth.cookie_secure)?;

    Ok((cookies, ApiResponse::ok(pair, "Access token refreshed")))
}

/// Handle password change for the authorized user
#[axum::debug_handler]
pub async fn change_password(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let repo = UserRepository::new(&state.pool);
    let sessions = SessionManager::new(&repo, &state.tokens, state.auth.bcrypt_cost);
    sessions.change_password(&context, payload).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}
