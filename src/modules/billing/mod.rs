use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/subscription",
            get(handler::get_subscription)
                .post(handler::change_plan)
                .delete(handler::cancel_subscription),
        )
        .route("/invoices", get(handler::list_invoices))
        .route("/payment-methods", get(handler::list_payment_methods))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
