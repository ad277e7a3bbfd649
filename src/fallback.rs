//! Degraded boot mode. When the database or Redis is not configured (or full
//! startup fails) the process still comes up and answers `/` and `/health`,
//! so the platform's health checks keep passing and the dashboard can show
//! which credentials are missing instead of a dead connection.
//!
//! CORS headers are written by hand here rather than through `CorsLayer`: the
//! response must carry an `Access-Control-Allow-Origin` on every path,
//! including unmatched ones, and unknown origins get the production dashboard
//! origin echoed back rather than no header at all.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::common::cors;
use crate::common::response::ApiResponse;
use crate::config::settings::AppConfig;
use crate::modules::health::dto::HealthResponse;

#[derive(Clone)]
pub struct FallbackState {
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl FallbackState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

pub fn fallback_router(state: FallbackState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .fallback(unmatched)
        .layer(middleware::from_fn_with_state(state.clone(), apply_cors))
        .with_state(state)
}

async fn root(State(state): State<FallbackState>) -> impl IntoResponse {
    Json(json!({
        "name": "burstlet-api",
        "mode": "fallback",
        "environment": state.config.environment,
        "hint": "set DATABASE_URL and REDIS_URL to enable the full API",
    }))
}

async fn health(State(state): State<FallbackState>) -> impl IntoResponse {
    Json(HealthResponse::new(
        &state.config,
        "fallback",
        state.started_at.elapsed().as_secs(),
    ))
}

async fn unmatched() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "not available while running in fallback mode",
        )),
    )
}

/// Echo the request origin when allow-listed, the production dashboard origin
/// otherwise, and short-circuit preflights with 204.
async fn apply_cors(
    State(state): State<FallbackState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let origin = cors::resolve_origin(&state.config, request_origin.as_deref());

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
