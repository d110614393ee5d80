//! Authentication handlers

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::extractors::AuthedUser;
use super::models::{
    AuthResponse, GuestRequest, LoginRequest, RegisterRequest, UpgradeRequest, User,
    UserResponse,
};
use super::services::{issue_token, AuthService};
use crate::common::{ApiError, AppState};
use crate::profiles::services::ProfilesService;

fn auth_response(state: &AppState, user: &User) -> Result<Json<AuthResponse>, ApiError> {
    let token = issue_token(user, &state.jwt_secret, state.jwt_ttl_hours)?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// POST /api/auth/register
///
/// # Request Body
/// ```json
/// { "email": "...", "password": "...", "role": "tutor", "username": "rahim_bd" }
/// ```
pub async fn register_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = AuthService::new(state.db.clone()).register(&payload).await?;
    auth_response(&state, &user)
}

/// POST /api/auth/login
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = AuthService::new(state.db.clone())
        .login(&payload.email, &payload.password)
        .await?;
    auth_response(&state, &user)
}

/// POST /api/auth/guest
/// Body is optional; a device fingerprint lets the same browser keep its guest account.
pub async fn guest_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Option<Json<GuestRequest>>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let user = AuthService::new(state.db.clone())
        .guest(payload.device_fingerprint.as_deref())
        .await?;
    auth_response(&state, &user)
}

/// POST /api/auth/upgrade
pub async fn upgrade_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<UpgradeRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = AuthService::new(state.db.clone())
        .upgrade(&authed.id, &payload)
        .await?;
    auth_response(&state, &user)
}

/// GET /api/me
/// Returns the current user and their profile
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = AuthService::new(state.db.clone())
        .find_user(&authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let profile = ProfilesService::new(state.db.clone())
        .get_profile(&authed.id)
        .await?;

    Ok(Json(serde_json::json!({
        "user": UserResponse::from(&user),
        "profile": profile,
    })))
}

/// POST /api/auth/logout
/// Tokens are stateless; the client drops its copy
pub async fn logout_handler(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!(user_id = %authed.id, "User logout successful");
    Ok(Json(serde_json::json!({
        "message": "Logout successful"
    })))
}
