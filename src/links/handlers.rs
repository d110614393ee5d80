// src/links/handlers.rs

use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::*;
use super::services::LinksService;
use crate::auth::AuthedUser;
use crate::common::validation::Validator;
use crate::common::{ApiError, AppState};

/// POST /api/links
pub async fn create_link_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    request: Option<Json<CreateLinkRequest>>,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate(&request).into_result()?;

    let state = state_lock.read().await.clone();
    let link = LinksService::new(state.db.clone())
        .create(&authed.id, request.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /api/links
pub async fn list_links_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Link>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(
        LinksService::new(state.db.clone())
            .list_for_owner(&authed.id)
            .await?,
    ))
}

/// GET /api/links/:id/messages
pub async fn link_history_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<LinkMessage>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(
        LinksService::new(state.db.clone())
            .history(&id, &authed.id)
            .await?,
    ))
}

/// DELETE /api/links/:id
pub async fn deactivate_link_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<Link>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(
        LinksService::new(state.db.clone())
            .deactivate(&id, &authed.id)
            .await?,
    ))
}

/// GET /api/public/links/:slug (no auth)
pub async fn public_link_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(slug): Path<String>,
) -> Result<Json<PublicLink>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(
        LinksService::new(state.db.clone())
            .public_link(&slug)
            .await?,
    ))
}

/// POST /api/public/links/:slug/messages (no auth)
pub async fn post_link_message_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(slug): Path<String>,
    Json(request): Json<PostLinkMessageRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate(&request).into_result()?;
    let state = state_lock.read().await.clone();
    LinksService::new(state.db.clone())
        .post_message(&slug, &request.content, request.fingerprint.as_deref())
        .await?;
    Ok(StatusCode::CREATED)
}
