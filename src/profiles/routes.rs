// src/profiles/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;

pub fn profiles_routes() -> Router {
    Router::new()
        .route(
            "/api/profile",
            get(handlers::get_profile_handler).put(handlers::update_profile_handler),
        )
        .route("/api/profile/presence", put(handlers::presence_handler))
        .route(
            "/api/profile/varsity/code",
            post(handlers::send_varsity_code_handler),
        )
        .route(
            "/api/profile/varsity/verify",
            post(handlers::verify_varsity_code_handler),
        )
        .route("/api/profile/student-id", post(handlers::student_id_handler))
        .route("/api/tutors/me", put(handlers::upsert_tutor_handler))
        .route("/api/students/me", put(handlers::upsert_student_handler))
        .route("/api/tutors/:id", get(handlers::tutor_card_handler))
}
