//! Dang That's Delicious web server library.
//!
//! The binary in `main.rs` wires configuration, logging and Sentry around
//! the router built by [`app`]; tests drive the same router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;

use state::AppState;

/// Build the application router with sessions, static files and uploads.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let static_dir = ServeDir::new(&state.config().static_dir);
    let uploads_dir = ServeDir::new(state.photos().uploads_dir());
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes::routes(max_upload_bytes))
        .nest_service("/static", static_dir)
        .nest_service("/uploads", uploads_dir)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;

    /// Router over a pool that never connects. Only routes that finish
    /// before touching the database can be exercised.
    fn test_app(dir: &tempfile::TempDir) -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/delicious_test")
            .unwrap();
        app(AppState::new(test_config(dir.path().to_path_buf()), pool))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir).oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_map_renders_for_anonymous_visitor() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir).oneshot(get("/map")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("id=\"map\""));
        assert!(body.contains("/login"));
    }

    #[tokio::test]
    async fn test_add_form_redirects_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir).oneshot(get("/add")).await.unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_heart_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/stores/1/heart")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let response = test_app(&dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_search_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(get("/api/search?q=%20"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[]");
    }

    #[tokio::test]
    async fn test_near_rejects_bad_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(get("/api/stores/near?lng=abc&lat=51.5"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "lng must be a number");
    }

    #[tokio::test]
    async fn test_uploads_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.png"), b"png").unwrap();
        let response = test_app(&dir)
            .oneshot(get("/uploads/abc.png"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "png");
    }
}
