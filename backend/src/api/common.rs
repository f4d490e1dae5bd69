//! Response envelope and error handling utilities for API responses.
//!
//! Every endpoint answers with the same JSON shape:
//! - `statusCode`: the HTTP status, repeated in the body
//! - `data`: the payload (`null` on failure)
//! - `message`: human-readable message
//! - `success`: `statusCode < 400`
//!
//! # Error Handling Flow
//! 1. Service layer returns domain-specific `ServiceError`
//! 2. `ApiError::from` picks the status code and client message
//! 3. Internal failures are logged and flattened to a generic message

use crate::errors::ServiceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Create a response; `success` follows from the status code
    pub fn new(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    /// Create a successful response
    pub fn success(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self::new(status, Some(data), message)
    }

    /// Create a successful response with 200 OK
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Error returned by handlers, rendered as the standard envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::new(self.status, None, self.message).into_response()
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation { message } => ApiError::new(StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound { entity, .. } => ApiError::new(
                StatusCode::NOT_FOUND,
                format!("{} does not exist", entity),
            ),
            ServiceError::AlreadyExists { message } => ApiError::new(StatusCode::CONFLICT, message),
            ServiceError::Unauthorized { message } => {
                ApiError::new(StatusCode::UNAUTHORIZED, message)
            }
            ServiceError::Database { source } => {
                tracing::error!("Database error: {:#}", source);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ServiceError::ExternalService { message } => {
                tracing::error!("External service error: {}", message);
                ApiError::new(StatusCode::BAD_GATEWAY, "Upstream service error")
            }
            ServiceError::InternalError { message, exposed } => {
                tracing::error!("Internal error: {}", message);
                if exposed {
                    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
                } else {
                    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            }
        }
    }
}
