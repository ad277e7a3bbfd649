use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::cors;
use crate::docs::ApiDoc;
use crate::state::AppState;

pub fn configure_routes(state: AppState) -> Router<AppState> {
    let cors = cors::cors_layer(&state.config);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(crate::modules::health::handler::health))
        .route("/api/v1/health", get(crate::modules::health::handler::health))
        .nest(
            "/api/v1/generation",
            crate::modules::generation::router(state.clone()),
        )
        .nest(
            "/api/v1/analytics",
            crate::modules::analytics::router(state.clone()),
        )
        .nest("/api/v1/billing", crate::modules::billing::router(state))
        .layer(cors)
}
