use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use super::dto::{
    ChangePlanRequest, InvoiceResponse, PaymentMethodResponse, SubscriptionResponse,
};
use super::service::BillingService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/billing/subscription",
    responses(
        (status = 200, description = "Current subscription", body = ApiResponse<SubscriptionResponse>)
    ),
    tag = "Billing",
    security(("bearer_auth" = []))
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match BillingService::get_subscription(state, user.id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Subscription retrieved"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/billing/subscription",
    request_body = ChangePlanRequest,
    responses(
        (status = 200, description = "Plan changed", body = ApiResponse<SubscriptionResponse>),
        (status = 502, description = "Stripe rejected the request")
    ),
    tag = "Billing",
    security(("bearer_auth" = []))
)]
pub async fn change_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChangePlanRequest>,
) -> impl IntoResponse {
    match BillingService::change_plan(state, user.id, user.email.clone(), req.plan).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Plan changed"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/billing/subscription",
    responses(
        (status = 200, description = "Subscription canceled", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "No subscription")
    ),
    tag = "Billing",
    security(("bearer_auth" = []))
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match BillingService::cancel_subscription(state, user.id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Subscription canceled"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/billing/invoices",
    responses(
        (status = 200, description = "Invoice history", body = ApiResponse<Vec<InvoiceResponse>>)
    ),
    tag = "Billing",
    security(("bearer_auth" = []))
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match BillingService::list_invoices(state, user.id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Invoices retrieved"), StatusCode::OK)
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/billing/payment-methods",
    responses(
        (status = 200, description = "Saved payment methods", body = ApiResponse<Vec<PaymentMethodResponse>>)
    ),
    tag = "Billing",
    security(("bearer_auth" = []))
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match BillingService::list_payment_methods(state, user.id).await {
        Ok(res) => ApiSuccess(
            ApiResponse::success(res, "Payment methods retrieved"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
