// src/applications/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn applications_routes() -> Router {
    Router::new()
        .route(
            "/api/applications",
            get(handlers::list_applications_handler).post(handlers::create_application_handler),
        )
        .route(
            "/api/applications/:id/accept",
            post(handlers::accept_application_handler),
        )
        .route(
            "/api/applications/:id/reject",
            post(handlers::reject_application_handler),
        )
}
