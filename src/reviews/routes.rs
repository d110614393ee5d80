// src/reviews/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn reviews_routes() -> Router {
    Router::new()
        .route("/api/reviews", post(handlers::create_review_handler))
        .route("/api/users/:id/reviews", get(handlers::user_reviews_handler))
        .route("/api/users/:id/reputation", get(handlers::reputation_handler))
}
