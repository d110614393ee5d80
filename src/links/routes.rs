// src/links/routes.rs

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers;

pub fn links_routes() -> Router {
    Router::new()
        .route(
            "/api/links",
            get(handlers::list_links_handler).post(handlers::create_link_handler),
        )
        .route("/api/links/:id", delete(handlers::deactivate_link_handler))
        .route(
            "/api/links/:id/messages",
            get(handlers::link_history_handler),
        )
        // Public side, no account needed
        .route("/api/public/links/:slug", get(handlers::public_link_handler))
        .route(
            "/api/public/links/:slug/messages",
            post(handlers::post_link_message_handler),
        )
}
