//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle login, logout, token refreshing and password change.
//! They are merged into the users router mounted by `main`.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{Router, middleware, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout).layer(middleware::from_fn(jwt_auth)))
        .route(
            "/change-password",
            post(change_password).layer(middleware::from_fn(jwt_auth)),
        )
}
