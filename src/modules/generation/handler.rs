use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::dto::{
    CreateBlogJobRequest, CreateSocialJobRequest, CreateVideoJobRequest, EstimateResponse,
    JobSnapshot,
};
use super::model::JobType;
use super::service::GenerationService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::AuthUser;
use crate::providers::GenerationInput;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/generation/video",
    request_body = CreateVideoJobRequest,
    responses(
        (status = 201, description = "Video job accepted", body = ApiResponse<JobSnapshot>),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Provider not configured")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn create_video_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateVideoJobRequest>,
) -> impl IntoResponse {
    match GenerationService::submit(state, user.id, JobType::Video, req).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Video job created"), StatusCode::CREATED)
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/generation/blog",
    request_body = CreateBlogJobRequest,
    responses(
        (status = 201, description = "Blog job accepted", body = ApiResponse<JobSnapshot>),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Provider not configured")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn create_blog_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBlogJobRequest>,
) -> impl IntoResponse {
    match GenerationService::submit(state, user.id, JobType::Blog, req).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Blog job created"), StatusCode::CREATED)
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/generation/social",
    request_body = CreateSocialJobRequest,
    responses(
        (status = 201, description = "Social job accepted", body = ApiResponse<JobSnapshot>),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Provider not configured")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn create_social_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateSocialJobRequest>,
) -> impl IntoResponse {
    match GenerationService::submit(state, user.id, JobType::Social, req).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Social job created"), StatusCode::CREATED)
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/generation/jobs",
    responses(
        (status = 200, description = "List recent jobs", body = ApiResponse<Vec<JobSnapshot>>)
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match GenerationService::list_jobs(state, user.id).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Jobs retrieved"), StatusCode::OK).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/generation/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Current job snapshot", body = ApiResponse<JobSnapshot>),
        (status = 404, description = "Job not found")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match GenerationService::get_job(state, user.id, id).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Job retrieved"), StatusCode::OK).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/generation/jobs/{id}/cancel",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job canceled", body = ApiResponse<JobSnapshot>),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job already terminal")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn cancel_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match GenerationService::cancel(state, user.id, id).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Job canceled"), StatusCode::OK).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/generation/estimate",
    request_body = GenerationInput,
    responses(
        (status = 200, description = "Estimated cost", body = ApiResponse<EstimateResponse>),
        (status = 503, description = "No provider for this capability")
    ),
    tag = "Generation",
    security(("bearer_auth" = []))
)]
pub async fn estimate_cost(
    State(state): State<AppState>,
    Json(input): Json<GenerationInput>,
) -> impl IntoResponse {
    match GenerationService::estimate(&state, &input) {
        Ok(cost_usd) => ApiSuccess(
            ApiResponse::success(EstimateResponse { cost_usd }, "Cost estimated"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
