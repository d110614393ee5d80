// src/appointments/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;

pub fn appointments_routes() -> Router {
    Router::new()
        .route("/api/appointments", get(handlers::list_appointments_handler))
        .route(
            "/api/appointments/events",
            get(handlers::appointment_events_handler),
        )
        .route("/api/appointments/:id/otp", post(handlers::issue_otp_handler))
        .route("/api/appointments/:id/qr", get(handlers::qr_handler))
        .route(
            "/api/appointments/:id/verify",
            post(handlers::verify_otp_handler),
        )
        .route(
            "/api/appointments/:id/complete",
            post(handlers::complete_handler),
        )
        .route("/api/appointments/:id/cancel", post(handlers::cancel_handler))
        .route("/api/appointments/:id/payment", put(handlers::payment_handler))
}
