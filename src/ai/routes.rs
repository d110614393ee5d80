// src/ai/routes.rs

use axum::{routing::post, Router};

use super::handlers;

pub fn ai_routes() -> Router {
    Router::new()
        .route("/api/ai-chat", post(handlers::ai_chat_handler))
        .route(
            "/api/ai-recommendation",
            post(handlers::ai_recommendation_handler),
        )
        .route("/api/search", post(handlers::search_handler))
        .route("/api/identify-zone", post(handlers::identify_zone_handler))
        .route(
            "/api/gemini-bio-generator",
            post(handlers::bio_generator_handler),
        )
        .route("/api/analyze-id-card", post(handlers::analyze_id_card_handler))
}
