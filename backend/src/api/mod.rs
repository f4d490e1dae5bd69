//! Central module for organizing the application's HTTP API.
//!
//! Authentication and account routes share the `/api/v1/users` prefix; the
//! root path answers with a small health envelope.

pub mod common;
pub mod upload;
pub mod user;

use crate::api::common::ApiResponse;
use crate::auth::routes::auth_router;
use crate::state::AppState;
use axum::{Extension, Router, routing::get};
use std::sync::Arc;
use user::routes::user_router;

/// Builds the application router with shared state attached.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/api/v1/users", auth_router().merge(user_router()))
        .layer(Extension(state))
}

async fn root_handler() -> ApiResponse<serde_json::Value> {
    ApiResponse::ok(
        serde_json::json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Service is healthy",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::test_support::test_state;
    use axum::{
        body::{Body, to_bytes},
        http::{HeaderMap, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BOUNDARY: &str = "account-backend-boundary";

    async fn test_app() -> Router {
        router(test_state(memory_pool().await))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn multipart_request(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        request
    }

    fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookie| cookie.strip_prefix(&format!("{name}=")))
            .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
    }

    async fn register_amy(app: &Router) -> (StatusCode, Value) {
        let body = multipart(
            &[
                ("fullName", "Amy Pond"),
                ("email", "amy@x.com"),
                ("username", "Amy"),
                ("password", "p1"),
            ],
            &[("avatar", "me.png", b"png-bytes")],
        );
        let (status, _, json) =
            send(app, multipart_request("POST", "/api/v1/users/register", body)).await;
        (status, json)
    }

    async fn login_amy(app: &Router, password: &str) -> (StatusCode, HeaderMap, Value) {
        send(
            app,
            json_request(
                "/api/v1/users/login",
                json!({"username": "amy", "password": password}),
            ),
        )
        .await
    }

    #[tokio::test]
    async fn test_health_envelope() {
        let app = test_app().await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_register_then_login_sets_cookies() {
        let app = test_app().await;

        let (status, body) = register_amy(&app).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "user registered successfully");
        assert_eq!(body["data"]["username"], "amy");
        assert_eq!(body["data"]["avatarUrl"], "https://cdn.test/1");
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("passwordHash").is_none());
        assert!(body["data"].get("refreshToken").is_none());

        let (status, _) = register_amy(&app).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, headers, body) = login_amy(&app, "p1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["email"], "amy@x.com");
        let refresh = body["data"]["refreshToken"].as_str().unwrap();
        assert_eq!(cookie_value(&headers, "refreshToken").as_deref(), Some(refresh));
        assert!(cookie_value(&headers, "accessToken").is_some());

        let cookies: Vec<_> = headers.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        for cookie in cookies {
            let cookie = cookie.to_str().unwrap();
            assert!(cookie.contains("HttpOnly"));
            assert!(cookie.contains("Secure"));
        }
    }

    #[tokio::test]
    async fn test_register_requires_avatar() {
        let app = test_app().await;
        let body = multipart(
            &[
                ("fullName", "Amy Pond"),
                ("email", "amy@x.com"),
                ("username", "amy"),
                ("password", "p1"),
            ],
            &[],
        );
        let (status, _, body) =
            send(&app, multipart_request("POST", "/api/v1/users/register", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Avatar file is required");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_replay() {
        let app = test_app().await;
        register_amy(&app).await;
        let (_, _, body) = login_amy(&app, "p1").await;
        let first = body["data"]["refreshToken"].as_str().unwrap().to_string();

        let (status, headers, body) = send(
            &app,
            json_request("/api/v1/users/refresh", json!({"refreshToken": first})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = body["data"]["refreshToken"].as_str().unwrap().to_string();
        assert_ne!(first, second);
        assert_eq!(cookie_value(&headers, "refreshToken"), Some(second.clone()));

        let (status, _, body) = send(
            &app,
            json_request("/api/v1/users/refresh", json!({"refreshToken": first})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Refresh token is expired or used");

        // The cookie is read before the body.
        let mut request = json_request("/api/v1/users/refresh", json!({}));
        request.headers_mut().insert(
            header::COOKIE,
            format!("refreshToken={second}").parse().unwrap(),
        );
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) =
            send(&app, json_request("/api/v1/users/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized request");
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = test_app().await;
        register_amy(&app).await;
        let (_, _, body) = login_amy(&app, "p1").await;
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();
        let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

        let (status, headers, _) = send(
            &app,
            with_bearer(json_request("/api/v1/users/logout", json!({})), &access),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for cookie in headers.get_all(header::SET_COOKIE) {
            assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
        }

        let (status, _, _) = send(
            &app,
            json_request("/api/v1/users/refresh", json!({"refreshToken": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_access_token() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/v1/users/me")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());

        let request = with_bearer(
            Request::builder()
                .uri("/api/v1/users/me")
                .body(Body::empty())
                .unwrap(),
            "not-a-jwt",
        );
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_and_profile_updates() {
        let app = test_app().await;
        register_amy(&app).await;
        let (_, _, body) = login_amy(&app, "p1").await;
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();

        let mut request = Request::builder()
            .uri("/api/v1/users/me")
            .body(Body::empty())
            .unwrap();
        request.headers_mut().insert(
            header::COOKIE,
            format!("accessToken={access}").parse().unwrap(),
        );
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["fullName"], "Amy Pond");

        let mut request = json_request(
            "/api/v1/users/account",
            json!({"fullName": "Amelia Pond", "email": "amelia@x.com"}),
        );
        *request.method_mut() = axum::http::Method::PATCH;
        let (status, _, body) = send(&app, with_bearer(request, &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "amelia@x.com");

        let upload = multipart(&[], &[("coverImage", "wide.jpg", b"jpg-bytes")]);
        let request = multipart_request("PATCH", "/api/v1/users/cover-image", upload);
        let (status, _, body) = send(&app, with_bearer(request, &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["coverImageUrl"], "https://cdn.test/2");

        let request = multipart_request("PATCH", "/api/v1/users/avatar", multipart(&[], &[]));
        let (status, _, body) = send(&app, with_bearer(request, &access)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Avatar file is missing");
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = test_app().await;
        register_amy(&app).await;
        let (_, _, body) = login_amy(&app, "p1").await;
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();

        let request = with_bearer(
            json_request(
                "/api/v1/users/change-password",
                json!({"oldPassword": "wrong", "newPassword": "p2"}),
            ),
            &access,
        );
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = with_bearer(
            json_request(
                "/api/v1/users/change-password",
                json!({"oldPassword": "p1", "newPassword": "p2"}),
            ),
            &access,
        );
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _, _) = login_amy(&app, "p1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, _) = login_amy(&app, "p2").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_multipart_rejections_use_envelope() {
        let app = test_app().await;

        let request = json_request("/api/v1/users/register", json!({"username": "amy"}));
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());

        let oversized = vec![0u8; user::routes::UPLOAD_BODY_LIMIT + 1];
        let body = multipart(
            &[("fullName", "Amy Pond")],
            &[("avatar", "huge.png", oversized.as_slice())],
        );
        let (status, _, body) =
            send(&app, multipart_request("POST", "/api/v1/users/register", body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["statusCode"], 413);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_avatar_replacement_behind_auth() {
        let app = test_app().await;
        register_amy(&app).await;
        let (_, _, body) = login_amy(&app, "p1").await;
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();

        let upload = || multipart(&[], &[("avatar", "new.png", b"new-png")]);
        let request = multipart_request("PATCH", "/api/v1/users/avatar", upload());
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = multipart_request("PATCH", "/api/v1/users/avatar", upload());
        let (status, _, body) = send(&app, with_bearer(request, &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["avatarUrl"], "https://cdn.test/2");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
