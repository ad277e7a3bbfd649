use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/video", post(handler::create_video_job))
        .route("/blog", post(handler::create_blog_job))
        .route("/social", post(handler::create_social_job))
        .route("/estimate", post(handler::estimate_cost))
        .route("/jobs", get(handler::list_jobs))
        .route("/jobs/{id}", get(handler::get_job))
        .route("/jobs/{id}/cancel", post(handler::cancel_job))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
