use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::dto::{AnalyticsQuery, OverviewResponse, TimeseriesPoint};
use super::service::AnalyticsService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/analytics/overview",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Aggregate metrics", body = ApiResponse<OverviewResponse>),
        (status = 400, description = "Invalid date range")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> impl IntoResponse {
    match AnalyticsService::overview(state, user.id, query).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Analytics retrieved"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/timeseries",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Daily view counts", body = ApiResponse<Vec<TimeseriesPoint>>),
        (status = 400, description = "Invalid date range")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
pub async fn timeseries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> impl IntoResponse {
    match AnalyticsService::timeseries(state, user.id, query).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Timeseries retrieved"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
