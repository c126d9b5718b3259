//! HTTP surface: routing and request guards.

pub mod handlers;
pub mod middleware;

use crate::state::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/Patient/$create-request",
            post(handlers::patient::create_patient),
        )
        .route(
            "/Patient/$confirm-request",
            post(handlers::patient::confirm_create_patient),
        )
        .route("/Patient/:id/$update", post(handlers::patient::update_patient))
        .route(
            "/Patient/:id/$update-email",
            post(handlers::patient::update_patient_email),
        )
        .route(
            "/Patient/:id/$update-identity",
            post(handlers::patient::update_patient_identity),
        )
        .route(
            "/Patient/:id/$confirm-identity",
            post(handlers::patient::confirm_update_patient_identity),
        )
        .layer(from_fn(middleware::require_json_content_type))
        .with_state(state)
}
