use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/overview", get(handler::overview))
        .route("/timeseries", get(handler::timeseries))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
