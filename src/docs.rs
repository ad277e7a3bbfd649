use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::handler::health,
        crate::modules::generation::handler::create_video_job,
        crate::modules::generation::handler::create_blog_job,
        crate::modules::generation::handler::create_social_job,
        crate::modules::generation::handler::list_jobs,
        crate::modules::generation::handler::get_job,
        crate::modules::generation::handler::cancel_job,
        crate::modules::generation::handler::estimate_cost,
        crate::modules::analytics::handler::overview,
        crate::modules::analytics::handler::timeseries,
        crate::modules::billing::handler::get_subscription,
        crate::modules::billing::handler::change_plan,
        crate::modules::billing::handler::cancel_subscription,
        crate::modules::billing::handler::list_invoices,
        crate::modules::billing::handler::list_payment_methods,
    ),
    components(
        schemas(
            crate::modules::health::dto::HealthResponse,
            crate::modules::health::dto::ServiceFlags,
            crate::modules::generation::dto::CreateVideoJobRequest,
            crate::modules::generation::dto::CreateBlogJobRequest,
            crate::modules::generation::dto::CreateSocialJobRequest,
            crate::modules::generation::dto::JobSnapshot,
            crate::modules::generation::dto::JobResult,
            crate::modules::generation::dto::JobError,
            crate::modules::generation::dto::EstimateResponse,
            crate::modules::generation::model::JobType,
            crate::modules::generation::model::JobStatus,
            crate::providers::GenerationInput,
            crate::providers::GenerationOutput,
            crate::modules::analytics::dto::OverviewResponse,
            crate::modules::analytics::dto::PlatformBreakdown,
            crate::modules::analytics::dto::TimeseriesPoint,
            crate::modules::billing::dto::ChangePlanRequest,
            crate::modules::billing::dto::SubscriptionResponse,
            crate::modules::billing::dto::InvoiceResponse,
            crate::modules::billing::dto::PaymentMethodResponse,
            crate::modules::billing::model::Plan,
        )
    ),
    tags(
        (name = "Health", description = "Process health and service availability"),
        (name = "Generation", description = "AI content generation jobs"),
        (name = "Analytics", description = "Published content performance"),
        (name = "Billing", description = "Subscriptions, invoices and payment methods")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
