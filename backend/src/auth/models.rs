//! Data structures for authentication-related requests and responses.
//!
//! This module defines the login, refresh and password-change payloads and
//! the per-request identity attached by the authorization middleware.

use crate::database::models::UserView;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Rejects values that are empty or only whitespace.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::from("is required")));
    }
    Ok(())
}

/// Login request payload; either `username` or `email` identifies the user
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,

    pub email: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "non_blank", message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    /// Normalized identity fields; blank values count as absent.
    pub fn identity(&self) -> (Option<String>, Option<String>) {
        let normalize = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_lowercase)
        };
        (normalize(&self.username), normalize(&self.email))
    }
}

/// Login response containing tokens and user info
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token refresh request, used when the cookie is absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(custom(function = "non_blank", message = "Old password is required"))]
    pub old_password: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank", message = "New password is required"))]
    pub new_password: String,
}

/// Identity of an authorized request, attached by `jwt_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}
