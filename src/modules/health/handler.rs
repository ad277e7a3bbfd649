use axum::{Json, extract::State, response::IntoResponse};

use super::dto::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process health and service availability", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::new(
        &state.config,
        "full",
        state.uptime_secs(),
    ))
}
