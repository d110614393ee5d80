// src/discovery/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn discovery_routes() -> Router {
    Router::new()
        .route("/api/tutors", get(handlers::search_tutors_handler))
        .route("/api/tutors/nearby", get(handlers::nearby_tutors_handler))
}
