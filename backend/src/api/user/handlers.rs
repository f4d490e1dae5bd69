//! Handler functions for user registration and profile endpoints.
//!
//! Multipart bodies are spooled to the upload directory first; the spooled
//! files are removed when the handler returns, whatever the outcome.

use crate::api::common::{ApiError, ApiResponse};
use crate::api::upload::MultipartForm;
use crate::auth::models::AuthContext;
use crate::database::models::UserView;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::{RegisterUser, UpdateAccountRequest, UserService};
use crate::state::AppState;
use axum::{
    extract::{
        Extension, Json, Multipart,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use std::sync::Arc;

const AVATAR_FIELD: &str = "avatar";
const COVER_IMAGE_FIELD: &str = "coverImage";

/// Registers a new user from a multipart form.
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let mut form = MultipartForm::read(
        multipart,
        &[AVATAR_FIELD, COVER_IMAGE_FIELD],
        &state.storage.upload_dir,
    )
    .await?;

    let input = RegisterUser {
        full_name: form.take_text("fullName"),
        email: form.take_text("email"),
        username: form.take_text("username"),
        password: form.take_text("password"),
        avatar: form.take_file(AVATAR_FIELD),
        cover_image: form.take_file(COVER_IMAGE_FIELD),
    };

    let repo = UserRepository::new(&state.pool);
    let users = UserService::new(&repo, state.object_store.as_ref(), state.auth.bcrypt_cost);
    let user = users.register(input).await?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        user,
        "user registered successfully",
    ))
}

/// Returns the authorized user.
#[axum::debug_handler]
pub async fn current_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let repo = UserRepository::new(&state.pool);
    let users = UserService::new(&repo, state.object_store.as_ref(), state.auth.bcrypt_cost);
    let user = users.get_user_required(&context.user_id).await?;

    Ok(ApiResponse::ok(user, "current user fetched successfully"))
}

#[axum::debug_handler]
pub async fn update_account(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let repo = UserRepository::new(&state.pool);
    let users = UserService::new(&repo, state.object_store.as_ref(), state.auth.bcrypt_cost);
    let user = users.update_account(&context.user_id, payload).await?;

    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

#[axum::debug_handler]
pub async fn update_avatar(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let mut form =
        MultipartForm::read(multipart, &[AVATAR_FIELD], &state.storage.upload_dir).await?;

    let repo = UserRepository::new(&state.pool);
    let users = UserService::new(&repo, state.object_store.as_ref(), state.auth.bcrypt_cost);
    let user = users
        .update_avatar(&context.user_id, form.take_file(AVATAR_FIELD))
        .await?;

    Ok(ApiResponse::ok(user, "Avatar image updated successfully"))
}

#[axum::debug_handler]
pub async fn update_cover_image(
    Extension(state): Extension<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    let mut form =
        MultipartForm::read(multipart, &[COVER_IMAGE_FIELD], &state.storage.upload_dir).await?;

    let repo = UserRepository::new(&state.pool);
    let users = UserService::new(&repo, state.object_store.as_ref(), state.auth.bcrypt_cost);
    let user = users
        .update_cover_image(&context.user_id, form.take_file(COVER_IMAGE_FIELD))
        .await?;

    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}
