//! Defines the HTTP routes for registration and profile management.

use super::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
};

/// Upper bound for multipart bodies carrying images.
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn user_router() -> Router {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/me", get(current_user).layer(middleware::from_fn(jwt_auth)))
        .route(
            "/account",
            patch(update_account).layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/avatar",
            patch(update_avatar)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                .layer(middleware::from_fn(jwt_auth)),
        )
        .route(
            "/cover-image",
            patch(update_cover_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                .layer(middleware::from_fn(jwt_auth)),
        )
}
