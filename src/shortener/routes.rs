// src/shortener/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn shortener_routes() -> Router {
    Router::new()
        .route("/api/short-links", post(handlers::create_short_link_handler))
        .route("/s/:slug", get(handlers::redirect_handler))
}
