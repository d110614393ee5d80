// src/pitch/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn pitch_routes() -> Router {
    Router::new().route("/api/pitch/stats", get(handlers::pitch_stats_handler))
}
