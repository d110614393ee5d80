//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/register` - Email/password sign-up as student or tutor
/// - `POST /api/auth/login` - Email/password login
/// - `POST /api/auth/guest` - Anonymous guest session
/// - `POST /api/auth/upgrade` - Convert the current guest into a full account
/// - `POST /api/auth/logout` - Logout (client-side token removal)
/// - `GET /api/me` - Current user and profile
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .route("/api/auth/guest", post(handlers::guest_handler))
        .route("/api/auth/upgrade", post(handlers::upgrade_handler))
        .route("/api/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
