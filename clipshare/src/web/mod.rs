// SPDX-License-Identifier: GPL-2.0-or-later
use axum::{
    extract::{DefaultBodyLimit, Extension, Request},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clipshare_api_structs::ErrorBody;
use tower_http::{
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{error, Level};
use ulid::Ulid;

use crate::db::SqliteStore;
use crate::service::ClipService;
use crate::Error;

pub(crate) mod handlers;

/// Request header carrying the password for a private clip.
pub const PASSWORD_HEADER: &str = "x-clip-password";

/// Room for JSON framing and escaping around the largest allowed clip.
const BODY_OVERHEAD: usize = 64 * 1024;

pub fn create_router(service: ClipService<SqliteStore>, max_content_bytes: usize) -> Router {
    Router::new()
        .route("/status/", get(handlers::status::get))
        .route("/api/clips", post(handlers::clip::create))
        .route("/api/clips/:slug", get(handlers::clip::get))
        .fallback(handle_404)
        .layer(DefaultBodyLimit::max(
            max_content_bytes.saturating_mul(2).saturating_add(BODY_OVERHEAD),
        ))
        .layer(Extension(service))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!("request",
                        id = %Ulid::new(),
                        method = %request.method(),
                        path = %request.uri().path(),
                        version = ?request.version(),
                        header = ?request.headers(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(SetSensitiveRequestHeadersLayer::new([
            HeaderName::from_static(PASSWORD_HEADER),
            axum::http::header::AUTHORIZATION,
        ]))
}

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "This isn't the endpoint you're looking for".into(),
        }),
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) | Error::SlugConflict => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Gone => StatusCode::GONE,
            Error::PasswordRequired => StatusCode::UNAUTHORIZED,
            Error::PasswordIncorrect => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if self.is_internal() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, HeaderValue, Method},
    };
    use clipshare_api_structs::{ClipCreated, ClipView, Status};
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::*;
    use crate::password::tests::fast_hasher;

    async fn router() -> Router {
        let service = ClipService::new(SqliteStore::in_memory().await.unwrap(), fast_hasher(), 64);
        create_router(service, 64)
    }

    fn post_json(body: serde_json::Value) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/clips")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn error_message(response: Response) -> String {
        json::<ErrorBody>(response).await.error
    }

    #[tokio::test]
    async fn create_and_read() {
        let router = router().await;

        let response = send(
            &router,
            post_json(serde_json::json!({"content": "hi", "expiresIn": "1d"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created: ClipCreated = json(response).await;
        assert!(created.expires_at.is_some());

        let response = send(&router, get_request(&format!("/api/clips/{}", created.slug))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view: ClipView = json(response).await;
        assert_eq!(view.content, "hi");
        assert_eq!(view.views, 1);
    }

    #[tokio::test]
    async fn private_clip_statuses() {
        let router = router().await;
        let created: ClipCreated = json(
            send(
                &router,
                post_json(serde_json::json!({
                    "content": "secret",
                    "isPrivate": true,
                    "password": "p",
                    "customSlug": "locked",
                })),
            )
            .await,
        )
        .await;
        assert_eq!(created.slug, "locked");

        let response = send(&router, get_request("/api/clips/locked")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&router, get_request("/api/clips/locked?password=nope")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = axum::http::Request::builder()
            .uri("/api/clips/locked")
            .header(PASSWORD_HEADER, "p")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view: ClipView = json(response).await;
        assert_eq!(view.content, "secret");

        let response = send(&router, get_request("/api/clips/locked?password=p")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn utf8_password_header() {
        let router = router().await;
        let response = send(
            &router,
            post_json(serde_json::json!({
                "content": "umlaut",
                "isPrivate": true,
                "password": "pässword",
                "customSlug": "accented",
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let password = HeaderValue::try_from("pässword".to_string()).unwrap();
        let request = axum::http::Request::builder()
            .uri("/api/clips/accented")
            .header(PASSWORD_HEADER, password)
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view: ClipView = json(response).await;
        assert_eq!(view.content, "umlaut");

        let request = axum::http::Request::builder()
            .uri("/api/clips/accented")
            .header(PASSWORD_HEADER, HeaderValue::from_bytes(b"p\xffss").unwrap())
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_requests() {
        let router = router().await;

        let response = send(&router, post_json(serde_json::json!({"content": ""}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&router, post_json(serde_json::json!({"isPrivate": true}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &router,
            post_json(serde_json::json!({"content": "x", "expiresIn": "forever"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &router,
            post_json(serde_json::json!({"content": "x".repeat(65)})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn slug_taken() {
        let router = router().await;
        let body = serde_json::json!({"content": "x", "customSlug": "dupe"});

        let response = send(&router, post_json(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&router, post_json(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_message(response).await,
            "The requested slug is already taken"
        );
    }

    #[tokio::test]
    async fn missing_clip_and_unknown_route() {
        let router = router().await;

        let response = send(&router, get_request("/api/clips/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_message(response).await, "Clip not found");

        let response = send(&router, get_request("/no/such/route")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status() {
        let router = router().await;

        let response = send(&router, get_request("/status/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let status: Status = json(response).await;
        assert_eq!(status.db_connections, 1);
    }

    #[tokio::test]
    async fn status_without_database() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.pool().close().await;
        let router = create_router(ClipService::new(store, fast_hasher(), 64), 64);

        let response = send(&router, get_request("/status/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn error_statuses() {
        let cases = [
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::SlugConflict, StatusCode::BAD_REQUEST),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::Gone, StatusCode::GONE),
            (Error::PasswordRequired, StatusCode::UNAUTHORIZED),
            (Error::PasswordIncorrect, StatusCode::FORBIDDEN),
            (
                Error::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_are_not_described() {
        let response = Error::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(error_message(response).await, "Internal server error");
    }
}
