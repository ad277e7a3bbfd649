//! End-to-end checks for the degraded boot mode, driven through the router
//! with no network, database or Redis.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use burstlet_api::config::settings::AppConfig;
use burstlet_api::fallback::{FallbackState, fallback_router};

fn blank_config() -> AppConfig {
    AppConfig {
        server_port: 3001,
        environment: "test".to_string(),
        database_url: None,
        redis_url: None,
        supabase_url: None,
        supabase_jwt_secret: None,
        openai_api_key: None,
        hailuo_api_key: None,
        minimax_api_key: None,
        stripe_secret_key: None,
        frontend_url: None,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_fallback_mode_and_missing_credentials() {
    let mut config = blank_config();
    config.openai_api_key = Some("sk-test".to_string());
    let app = fallback_router(FallbackState::new(config));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "fallback");
    assert_eq!(body["services"]["openai"], true);
    assert_eq!(body["services"]["database"], false);
    assert_eq!(body["services"]["redis"], false);
    assert_eq!(body["services"]["stripe"], false);
}

#[tokio::test]
async fn known_origin_is_echoed_back() {
    let app = fallback_router(FallbackState::new(blank_config()));

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn unknown_origin_gets_the_production_default() {
    let app = fallback_router(FallbackState::new(blank_config()));

    let response = app
        .oneshot(
            Request::get("/")
                .header(header::ORIGIN, "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://burstlet.vercel.app"
    );
}

#[tokio::test]
async fn frontend_url_is_allow_listed() {
    let mut config = blank_config();
    config.frontend_url = Some("https://preview.burstlet.dev".to_string());
    let app = fallback_router(FallbackState::new(config));

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://preview.burstlet.dev")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://preview.burstlet.dev"
    );
}

#[tokio::test]
async fn preflight_gets_204_with_cors_headers() {
    let app = fallback_router(FallbackState::new(blank_config()));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/generation/video")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS)
    );
}

#[tokio::test]
async fn unmatched_path_returns_json_404() {
    let app = fallback_router(FallbackState::new(blank_config()));

    let response = app
        .oneshot(
            Request::get("/api/v1/generation/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("fallback mode")
    );
}

#[tokio::test]
async fn root_names_the_service_and_mode() {
    let app = fallback_router(FallbackState::new(blank_config()));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "burstlet-api");
    assert_eq!(body["mode"], "fallback");
}
